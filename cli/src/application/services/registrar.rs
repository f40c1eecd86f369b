//! Application service: systemd service registration.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.

use std::path::Path;

use anyhow::Result;

use crate::application::ports::{
    Accounts, LocalFs, ProgressReporter, Prompter, ServiceManager, VersionControl,
};
use crate::application::services::configure::ask_optional;
use crate::application::services::secrets::upsert_secrets;
use crate::domain::config::{OwnershipPolicy, ServiceConfig};
use crate::domain::error::InstallError;
use crate::domain::host::HostContext;
use crate::domain::plan::InstallLayout;
use crate::domain::remote::rewrite_remote_url;
use crate::domain::secrets::BOT_AUTO_RESTART;
use crate::domain::unit::ServiceUnit;

/// Non-port inputs of [`register_service`].
pub struct RegistrarOptions<'a> {
    pub host: &'a HostContext,
    pub layout: &'a InstallLayout,
    pub service: &'a ServiceConfig,
    /// GitHub username to embed in the `origin` remote.
    pub github_username: Option<&'a str>,
    /// Comment written at the top of the unit file.
    pub header: String,
}

/// Outcome of the `register_service` use-case.
#[derive(Debug, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// Unit installed, enabled and (re)started.
    Started { name: String },
    /// Unit installed but left inactive.
    Registered { name: String, start_command: String },
}

/// Fail unless `layout` holds a finished installation: the directory, its
/// secrets file and the venv interpreter.
///
/// # Errors
///
/// Returns the matching "missing precondition" [`InstallError`].
pub fn check_installation(fs: &impl LocalFs, layout: &InstallLayout) -> Result<()> {
    if !fs.is_dir(&layout.root) {
        return Err(InstallError::InstallDirMissing(layout.root.clone()).into());
    }
    if !fs.exists(&layout.secrets_file()) {
        return Err(InstallError::SecretsFileMissing(layout.secrets_file()).into());
    }
    if !fs.exists(&layout.python()) {
        return Err(InstallError::RuntimeMissing(layout.python()).into());
    }
    Ok(())
}

/// Register the bot with systemd and optionally start it.
///
/// # Errors
///
/// Returns an error if the installation is incomplete, the service user
/// does not exist, or writing the unit or running systemctl fails.
pub async fn register_service(
    prompter: &impl Prompter,
    accounts: &impl Accounts,
    services: &impl ServiceManager,
    vcs: &impl VersionControl,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
    opts: RegistrarOptions<'_>,
) -> Result<RegistrationOutcome> {
    let RegistrarOptions {
        host,
        layout,
        service,
        github_username,
        header,
    } = opts;
    check_installation(fs, layout)?;

    let default_user = service.user.as_deref().unwrap_or(&host.invoking_user);
    let user = ask_optional(prompter, "Run the service as user", Some(default_user))?
        .unwrap_or_else(|| default_user.to_string());
    if !accounts.user_exists(&user).await? {
        return Err(InstallError::UnknownUser(user).into());
    }
    let group = accounts.primary_group(&user).await?;

    upsert_secrets(fs, &layout.secrets_file(), &[(BOT_AUTO_RESTART, "1")])?;
    reconcile_ownership(
        accounts,
        prompter,
        reporter,
        &layout.root,
        (&user, &group),
        service.ownership,
    )
    .await?;
    adjust_remote(vcs, fs, reporter, layout, github_username).await;

    let unit = ServiceUnit::for_install(
        &service.name,
        &layout.root,
        &layout.python(),
        &service.entry_point,
        &user,
        &group,
    );
    let content = unit.to_unit_file()?.with_comment(header).render();
    let unit_path = unit.install_path();
    reporter.step(&format!("Writing {}", unit_path.display()));
    services.install_unit(&unit_path, &content).await?;
    services.reload().await?;
    reporter.success(&format!("Service {} registered", unit.name));

    let question = format!("Enable and start {} now?", unit.name);
    if prompter.confirm(&question, true)? {
        services.enable(&unit.name).await?;
        services.restart(&unit.name).await?;
        reporter.success(&format!("Service {} is running", unit.name));
        return Ok(RegistrationOutcome::Started { name: unit.name });
    }

    let start_command = format!(
        "{}systemctl enable --now {}",
        host.elevation.prefix(),
        unit.name
    );
    reporter.info(&format!("Start it later with: {start_command}"));
    Ok(RegistrationOutcome::Registered {
        name: unit.name,
        start_command,
    })
}

/// Make `path` owned by `owner` according to `policy`. Returns `true` if
/// ownership was changed.
///
/// # Errors
///
/// Returns an error if ownership cannot be read or changed.
pub async fn reconcile_ownership(
    accounts: &impl Accounts,
    prompter: &impl Prompter,
    reporter: &impl ProgressReporter,
    path: &Path,
    owner: (&str, &str),
    policy: OwnershipPolicy,
) -> Result<bool> {
    let (user, group) = owner;
    let (current_user, current_group) = accounts.owner_of(path).await?;
    if current_user == user && current_group == group {
        return Ok(false);
    }

    let proceed = match policy {
        OwnershipPolicy::Always => true,
        OwnershipPolicy::Confirm => prompter.confirm(
            &format!(
                "{} is owned by {current_user}:{current_group}. Change owner to {user}:{group}?",
                path.display()
            ),
            true,
        )?,
    };
    if !proceed {
        reporter.warn(&format!(
            "{} stays owned by {current_user}:{current_group}; the service may not be able to write to it.",
            path.display()
        ));
        return Ok(false);
    }

    accounts.chown_recursive(path, user, group).await?;
    reporter.success(&format!("Ownership set to {user}:{group}"));
    Ok(true)
}

/// Rewrite the `origin` remote for HTTPS self-updates. Failures only warn.
pub async fn adjust_remote(
    vcs: &impl VersionControl,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
    layout: &InstallLayout,
    username: Option<&str>,
) {
    if !fs.exists(&layout.git_dir()) {
        return;
    }
    let current = match vcs.remote_url(&layout.root).await {
        Ok(Some(url)) => url,
        Ok(None) => return,
        Err(e) => {
            reporter.warn(&format!("Could not read git remote: {e}"));
            return;
        }
    };
    let rewritten = rewrite_remote_url(&current, username);
    if rewritten == current.trim() {
        return;
    }
    match vcs.set_remote_url(&layout.root, &rewritten).await {
        Ok(()) => reporter.success(&format!("origin remote set to {rewritten}")),
        Err(e) => reporter.warn(&format!("Could not update git remote: {e}")),
    }
}
