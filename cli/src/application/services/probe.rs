//! Application service: environment probing.
//!
//! Resolves the OS family, the privilege-elevation mode and the invoking
//! user into a single immutable `HostContext`.

use anyhow::Result;

use crate::application::ports::HostInspector;
use crate::domain::error::InstallError;
use crate::domain::host::{Elevation, HostContext, OsRelease};

/// Probe the host.
///
/// `sudo_user` is the `SUDO_USER` environment value, consulted only when
/// running as root so the service defaults to the human who invoked sudo.
///
/// # Errors
///
/// Returns [`InstallError::UnsupportedOs`] outside the Ubuntu family and
/// [`InstallError::NoPrivilegeEscalation`] when neither root nor sudo is
/// available.
pub async fn probe_host(host: &impl HostInspector, sudo_user: Option<&str>) -> Result<HostContext> {
    let os = OsRelease::parse(&host.os_release()?);
    os.ensure_supported()?;
    tracing::debug!(id = os.id(), "operating system accepted");

    let uid = host.effective_uid().await?;
    let elevation = if uid == 0 {
        Elevation::Root
    } else if host.sudo_available().await {
        Elevation::Sudo
    } else {
        return Err(InstallError::NoPrivilegeEscalation.into());
    };

    let sudo_user = sudo_user.map(str::trim).filter(|u| !u.is_empty() && *u != "root");
    let invoking_user = match (elevation, sudo_user) {
        (Elevation::Root, Some(user)) => user.to_string(),
        _ => host.login_name().await?,
    };
    tracing::debug!(?elevation, user = %invoking_user, "privileges resolved");

    Ok(HostContext {
        os,
        elevation,
        invoking_user,
    })
}
