//! Infrastructure implementation of the `VersionControl` port using `git`.

use std::path::Path;

use anyhow::Result;

use crate::application::ports::{CommandRunner, VersionControl};
use crate::domain::credentials::GitCredentials;
use crate::domain::error::InstallError;
use crate::infra::askpass::AskpassGuard;
use crate::infra::command_runner::ensure_success;
use crate::infra::signal::{claim_interrupts, interrupted};

/// `git` CLI client.
pub struct GitClient<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> GitClient<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

impl<R: CommandRunner> VersionControl for GitClient<R> {
    async fn clone_repo(
        &self,
        url: &str,
        branch: &str,
        dest: &Path,
        credentials: Option<&GitCredentials>,
    ) -> Result<()> {
        let dest = dest.display().to_string();
        let args = ["clone", "--branch", branch, "--", url, dest.as_str()];

        // Declared before the guard so the helper is gone before the
        // startup watcher can act again.
        let _claim = claim_interrupts();
        let guard = credentials.map(AskpassGuard::create).transpose()?;
        let env = match &guard {
            Some(guard) => guard.env(),
            None => vec![("GIT_TERMINAL_PROMPT", "0".to_string())],
        };
        let env: Vec<(&str, &str)> = env.iter().map(|(k, v)| (*k, v.as_str())).collect();
        tracing::debug!(
            url,
            branch,
            askpass = ?guard.as_ref().map(AskpassGuard::path),
            "cloning"
        );

        let output = tokio::select! {
            output = self.runner.run_with_env("git", &args, &env) => output?,
            () = interrupted() => {
                drop(guard);
                return Err(InstallError::Interrupted.into());
            }
        };
        drop(guard);
        ensure_success("git", &args, output)?;
        Ok(())
    }

    async fn remote_url(&self, repo: &Path) -> Result<Option<String>> {
        let repo = repo.display().to_string();
        let output = self
            .runner
            .run("git", &["-C", &repo, "remote", "get-url", "origin"])
            .await?;
        if !output.status.success() {
            return Ok(None);
        }
        let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!url.is_empty()).then_some(url))
    }

    async fn set_remote_url(&self, repo: &Path, url: &str) -> Result<()> {
        let repo = repo.display().to_string();
        let args = ["-C", repo.as_str(), "remote", "set-url", "origin", url];
        let output = self.runner.run("git", &args).await?;
        ensure_success("git", &args, output)?;
        Ok(())
    }
}
