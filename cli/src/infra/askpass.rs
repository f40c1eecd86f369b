//! Temporary `GIT_ASKPASS` helper holding GitHub credentials.
//!
//! The script lives for exactly as long as its [`AskpassGuard`]; dropping the
//! guard (normal return, error, or interrupt) deletes the file.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::TempPath;

use crate::domain::credentials::{GitCredentials, askpass_script};

/// Mode of the helper script: owner read/write/execute only.
pub const ASKPASS_MODE: u32 = 0o700;

/// Owns the on-disk askpass script.
#[derive(Debug)]
pub struct AskpassGuard {
    path: TempPath,
}

impl AskpassGuard {
    /// Write the helper script for `creds`.
    ///
    /// The write handle is closed before returning so the script can be
    /// executed right away.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be created or written.
    pub fn create(creds: &GitCredentials) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("zavod-askpass-")
            .suffix(".sh")
            .tempfile()
            .context("creating askpass helper")?;
        file.write_all(askpass_script(creds).as_bytes())
            .context("writing askpass helper")?;
        file.as_file()
            .sync_all()
            .context("flushing askpass helper")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(ASKPASS_MODE))
                .context("setting askpass helper permissions")?;
        }

        Ok(Self {
            path: file.into_temp_path(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Environment that routes git's credential prompts to the helper.
    #[must_use]
    pub fn env(&self) -> Vec<(&'static str, String)> {
        let path = self.path.display().to_string();
        vec![
            ("GIT_ASKPASS", path.clone()),
            ("SSH_ASKPASS", path),
            ("GIT_TERMINAL_PROMPT", "0".to_string()),
        ]
    }
}
