//! Host inspection and user accounts, implemented with coreutils.

use std::path::Path;

use anyhow::{Context, Result};

use crate::application::ports::{Accounts, CommandRunner, HostInspector};
use crate::domain::host::Elevation;
use crate::infra::command_runner::{ensure_success, run_elevated_status};

/// Checked in order; the first readable file wins.
pub const OS_RELEASE_PATHS: &[&str] = &["/etc/os-release", "/usr/lib/os-release"];

/// Run a query and return its trimmed stdout.
async fn query(runner: &impl CommandRunner, program: &str, args: &[&str]) -> Result<String> {
    let output = runner.run(program, args).await?;
    let output = ensure_success(program, args, output)?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Read-only host facts.
pub struct SystemHost<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> SystemHost<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

impl<R: CommandRunner> HostInspector for SystemHost<R> {
    fn os_release(&self) -> Result<String> {
        OS_RELEASE_PATHS
            .iter()
            .find_map(|path| std::fs::read_to_string(path).ok())
            .with_context(|| format!("cannot read any of {}", OS_RELEASE_PATHS.join(", ")))
    }

    async fn effective_uid(&self) -> Result<u32> {
        let uid = query(&self.runner, "id", &["-u"]).await?;
        uid.parse()
            .with_context(|| format!("unexpected output from id -u: {uid}"))
    }

    async fn login_name(&self) -> Result<String> {
        query(&self.runner, "id", &["-un"]).await
    }

    async fn sudo_available(&self) -> bool {
        self.runner
            .run("sh", &["-c", "command -v sudo"])
            .await
            .is_ok_and(|o| o.status.success())
    }
}

/// Account lookups and ownership changes.
pub struct SystemAccounts<R: CommandRunner> {
    runner: R,
    elevation: Elevation,
}

impl<R: CommandRunner> SystemAccounts<R> {
    pub fn new(runner: R, elevation: Elevation) -> Self {
        Self { runner, elevation }
    }
}

impl<R: CommandRunner> Accounts for SystemAccounts<R> {
    async fn user_exists(&self, user: &str) -> Result<bool> {
        let output = self.runner.run("id", &["-u", "--", user]).await?;
        Ok(output.status.success())
    }

    async fn primary_group(&self, user: &str) -> Result<String> {
        query(&self.runner, "id", &["-gn", "--", user]).await
    }

    async fn owner_of(&self, path: &Path) -> Result<(String, String)> {
        let path = path.display().to_string();
        let owner = query(&self.runner, "stat", &["-c", "%U:%G", "--", &path]).await?;
        owner
            .split_once(':')
            .map(|(user, group)| (user.to_string(), group.to_string()))
            .with_context(|| format!("unexpected output from stat: {owner}"))
    }

    async fn chown_recursive(&self, path: &Path, user: &str, group: &str) -> Result<()> {
        let path = path.display().to_string();
        let owner = format!("{user}:{group}");
        run_elevated_status(
            &self.runner,
            self.elevation,
            "chown",
            &["-R", "--", &owner, &path],
        )
        .await
    }
}
