//! Infrastructure implementation of the `ServiceManager` port using systemd.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, ServiceManager};
use crate::domain::host::Elevation;
use crate::infra::command_runner::run_elevated_status;

/// Mode of installed unit files.
pub const UNIT_FILE_MODE: &str = "644";

/// `systemctl` backed service manager.
pub struct SystemdManager<R: CommandRunner> {
    runner: R,
    elevation: Elevation,
}

impl<R: CommandRunner> SystemdManager<R> {
    pub fn new(runner: R, elevation: Elevation) -> Self {
        Self { runner, elevation }
    }

    async fn systemctl(&self, args: &[&str]) -> Result<()> {
        run_elevated_status(&self.runner, self.elevation, "systemctl", args).await
    }
}

impl<R: CommandRunner> ServiceManager for SystemdManager<R> {
    /// Stages `content` in a temp file, then copies it into place with an
    /// elevated `install`, which also sets owner and mode.
    async fn install_unit(&self, unit_path: &Path, content: &str) -> Result<()> {
        let mut staged = tempfile::Builder::new()
            .prefix("zavod-unit-")
            .suffix(".service")
            .tempfile()
            .context("creating staging file for unit")?;
        staged
            .write_all(content.as_bytes())
            .context("writing staged unit")?;
        staged.flush().context("flushing staged unit")?;

        let source = staged.path().display().to_string();
        let target = unit_path.display().to_string();
        run_elevated_status(
            &self.runner,
            self.elevation,
            "install",
            &["-m", UNIT_FILE_MODE, &source, &target],
        )
        .await
        .with_context(|| format!("installing unit to {target}"))
    }

    async fn reload(&self) -> Result<()> {
        self.systemctl(&["daemon-reload"]).await
    }

    async fn enable(&self, name: &str) -> Result<()> {
        self.systemctl(&["enable", name]).await
    }

    async fn restart(&self, name: &str) -> Result<()> {
        self.systemctl(&["restart", name]).await
    }
}
