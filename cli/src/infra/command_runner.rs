//! Infrastructure implementation of the `CommandRunner` port.
//!
//! `TokioCommandRunner` is the production implementation that uses tokio
//! for async process execution with guaranteed timeout and kill.

use std::process::{ExitStatus, Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};

use crate::application::ports::CommandRunner;
use crate::domain::error::InstallError;
use crate::domain::host::Elevation;

/// Default timeout for short host queries (`id`, `stat`, `git remote`).
pub const DEFAULT_CMD_TIMEOUT: Duration = Duration::from_secs(30);

/// Production `CommandRunner`.
///
/// Every child is spawned with `kill_on_drop`, so a run that is abandoned
/// (timeout, interrupt, dropped future) never leaves the process behind.
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TokioCommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_CMD_TIMEOUT)
    }
}

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.run_with_timeout(program, args, self.timeout).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output> {
        tracing::debug!(program, ?args, "running command");
        let child = spawn_captured(Command::new(program).args(args), program)?;
        tokio::select! {
            result = collect_output(child, program) => result,
            () = tokio::time::sleep(timeout) => {
                anyhow::bail!("{program} timed out after {}s", timeout.as_secs())
            }
        }
    }

    async fn run_with_env(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<Output> {
        let keys: Vec<&str> = env.iter().map(|(k, _)| *k).collect();
        tracing::debug!(program, ?args, env = ?keys, "running command");
        let mut command = Command::new(program);
        command.args(args);
        for (key, value) in env {
            command.env(key, value);
        }
        let child = spawn_captured(&mut command, program)?;
        collect_output(child, program).await
    }

    async fn run_status(&self, program: &str, args: &[&str]) -> Result<ExitStatus> {
        tracing::debug!(program, ?args, "running command");
        let mut child = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        child
            .wait()
            .await
            .with_context(|| format!("waiting for {program}"))
    }
}

fn spawn_captured(command: &mut Command, program: &str) -> Result<Child> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to spawn {program}"))
}

/// Wait for `child` while draining both pipes, so a chatty process cannot
/// block on a full pipe buffer.
async fn collect_output(mut child: Child, program: &str) -> Result<Output> {
    let mut stdout_handle = child.stdout.take();
    let mut stderr_handle = child.stderr.take();

    let (status, stdout, stderr) = tokio::join!(
        child.wait(),
        async {
            let mut buf = Vec::new();
            if let Some(ref mut h) = stdout_handle {
                let _ = h.read_to_end(&mut buf).await;
            }
            buf
        },
        async {
            let mut buf = Vec::new();
            if let Some(ref mut h) = stderr_handle {
                let _ = h.read_to_end(&mut buf).await;
            }
            buf
        },
    );
    Ok(Output {
        status: status.with_context(|| format!("waiting for {program}"))?,
        stdout,
        stderr,
    })
}

// ── Status checks ─────────────────────────────────────────────────────────────

/// Pass `output` through if the command succeeded, otherwise fail with
/// [`InstallError::CommandFailed`] carrying the last line of stderr.
///
/// # Errors
///
/// Returns [`InstallError::CommandFailed`] on a non-zero exit.
pub fn ensure_success(program: &str, args: &[&str], output: Output) -> Result<Output> {
    if output.status.success() {
        return Ok(output);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let detail = stderr.lines().rev().find(|l| !l.trim().is_empty());
    let status = match detail {
        Some(line) => format!("{}: {}", output.status, line.trim()),
        None => output.status.to_string(),
    };
    Err(InstallError::CommandFailed {
        command: display_command(program, args),
        status,
    }
    .into())
}

/// Like [`ensure_success`] for commands run with inherited stdio.
///
/// # Errors
///
/// Returns [`InstallError::CommandFailed`] on a non-zero exit.
pub fn ensure_status(program: &str, args: &[&str], status: ExitStatus) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    Err(InstallError::CommandFailed {
        command: display_command(program, args),
        status: status.to_string(),
    }
    .into())
}

// ── Elevated execution ────────────────────────────────────────────────────────

/// Run `program` with root privileges and inherited stdio.
///
/// # Errors
///
/// Returns an error if the command cannot be spawned or exits non-zero.
pub async fn run_elevated_status(
    runner: &impl CommandRunner,
    elevation: Elevation,
    program: &str,
    args: &[&str],
) -> Result<()> {
    let (program, args) = elevation.command(program, args);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let status = runner.run_status(&program, &args).await?;
    ensure_status(&program, &args, status)
}

fn display_command(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}
