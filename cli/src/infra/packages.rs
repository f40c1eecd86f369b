//! Infrastructure implementation of the `PackageManager` port using apt.

use anyhow::Result;

use crate::application::ports::{CommandRunner, PackageManager};
use crate::domain::host::Elevation;
use crate::infra::command_runner::run_elevated_status;

/// Keeps apt from stopping at debconf dialogs. Passed through `env` because
/// `sudo` resets the environment.
const NONINTERACTIVE: &str = "DEBIAN_FRONTEND=noninteractive";

/// `apt-get` backed package manager.
pub struct AptPackages<R: CommandRunner> {
    runner: R,
    elevation: Elevation,
}

impl<R: CommandRunner> AptPackages<R> {
    pub fn new(runner: R, elevation: Elevation) -> Self {
        Self { runner, elevation }
    }
}

impl<R: CommandRunner> PackageManager for AptPackages<R> {
    async fn install(&self, packages: &[String]) -> Result<()> {
        run_elevated_status(
            &self.runner,
            self.elevation,
            "env",
            &[NONINTERACTIVE, "apt-get", "update"],
        )
        .await?;

        let mut args = vec![NONINTERACTIVE, "apt-get", "install", "-y"];
        args.extend(packages.iter().map(String::as_str));
        run_elevated_status(&self.runner, self.elevation, "env", &args).await?;
        tracing::debug!(?packages, "packages installed");
        Ok(())
    }
}
