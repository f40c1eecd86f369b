//! Application service: secrets file persistence.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::Path;

use anyhow::{Context, Result};

use crate::application::ports::LocalFs;
use crate::domain::plan::InstallPlan;
use crate::domain::secrets::{
    DISCORD_TOKEN, GITHUB_TOKEN, GITHUB_USERNAME, SECRETS_FILE_MODE, SecretsFile,
};

/// Read the secrets file at `path`, `None` if it does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn load_secrets(fs: &impl LocalFs, path: &Path) -> Result<Option<SecretsFile>> {
    if !fs.exists(path) {
        return Ok(None);
    }
    let content = fs.read_to_string(path)?;
    Ok(Some(SecretsFile::parse(&content)))
}

/// Upsert `updates` into `base` and atomically replace `path` with the
/// result, readable by the owner only.
///
/// # Errors
///
/// Returns an error if a value is not a single line or the file cannot be
/// written.
pub fn write_secrets(
    fs: &impl LocalFs,
    path: &Path,
    mut base: SecretsFile,
    updates: &[(&str, &str)],
) -> Result<SecretsFile> {
    for (key, value) in updates {
        base.upsert(key, value)?;
    }
    fs.write_private(path, &base.render(), SECRETS_FILE_MODE)
        .with_context(|| format!("writing secrets to {}", path.display()))?;
    tracing::debug!(path = %path.display(), keys = updates.len(), "secrets written");
    Ok(base)
}

/// Upsert `updates` into whatever is currently stored at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or written.
pub fn upsert_secrets(fs: &impl LocalFs, path: &Path, updates: &[(&str, &str)]) -> Result<()> {
    let base = load_secrets(fs, path)?.unwrap_or_default();
    write_secrets(fs, path, base, updates)?;
    Ok(())
}

/// Write the Discord token and, when both halves are present, the GitHub
/// credentials of `plan`.
///
/// The base document is the secrets file read before provisioning, so keys
/// survive recreation of the install directory. Without one, whatever the
/// populated source tree contains is used.
///
/// # Errors
///
/// Returns an error if the file cannot be read or written.
pub fn persist_install_secrets(fs: &impl LocalFs, plan: &InstallPlan) -> Result<SecretsFile> {
    let path = plan.layout.secrets_file();
    let base = match &plan.existing_secrets {
        Some(existing) => existing.clone(),
        None => load_secrets(fs, &path)?.unwrap_or_default(),
    };

    let mut updates = vec![(DISCORD_TOKEN, plan.discord_token.as_str())];
    if let Some(creds) = &plan.credentials {
        updates.push((GITHUB_USERNAME, creds.username.as_str()));
        updates.push((GITHUB_TOKEN, creds.token.as_str()));
    }
    write_secrets(fs, &path, base, &updates)
}
