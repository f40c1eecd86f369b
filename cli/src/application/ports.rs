//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};
use std::time::Duration;

use anyhow::Result;

use crate::domain::InstallerConfig;
use crate::domain::credentials::GitCredentials;

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(&self, program: &str, args: &[&str], timeout: Duration)
    -> Result<Output>;
    /// Run a program with extra environment variables and capture its output.
    /// No timeout applies; dropping the future kills the child.
    async fn run_with_env(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<Output>;
    /// Run a program with inherited stdio and return only its exit status.
    async fn run_status(&self, program: &str, args: &[&str]) -> Result<ExitStatus>;
}

/// Lets several adapters share one runner.
impl<T: CommandRunner> CommandRunner for &T {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        (**self).run(program, args).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output> {
        (**self).run_with_timeout(program, args, timeout).await
    }

    async fn run_with_env(
        &self,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<Output> {
        (**self).run_with_env(program, args, env).await
    }

    async fn run_status(&self, program: &str, args: &[&str]) -> Result<ExitStatus> {
        (**self).run_status(program, args).await
    }
}

// ── Interaction Ports ─────────────────────────────────────────────────────────

/// Terminal prompts. Implementations return raw answers; default handling
/// and re-prompting live in the application services.
pub trait Prompter {
    /// Ask for a visible line of input. `default` is only displayed.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read.
    fn input(&self, prompt: &str, default: Option<&str>) -> Result<String>;
    /// Ask for a secret without echoing it.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read.
    fn secret(&self, prompt: &str) -> Result<String>;
    /// Ask a yes/no question. Anything but `y`/`n` resolves to `default`.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be read.
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;
}

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait, no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
    /// Emit an informational message.
    fn info(&self, message: &str);
}

// ── Config and Filesystem Ports ───────────────────────────────────────────────

/// Abstracts persistence of installer preferences.
pub trait ConfigStore {
    /// Load the configuration, returning defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    fn load(&self) -> Result<InstallerConfig>;
    /// Persist the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn save(&self, config: &InstallerConfig) -> Result<()>;
    /// Location of the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    fn path(&self) -> Result<PathBuf>;
}

/// Local filesystem operations used by the provisioning services.
pub trait LocalFs {
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    /// # Errors
    ///
    /// Returns an error if `path` cannot be listed.
    fn is_empty_dir(&self, path: &Path) -> Result<bool>;
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    /// # Errors
    ///
    /// Returns an error if the directory cannot be removed.
    fn remove_dir_all(&self, path: &Path) -> Result<()>;
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    fn read_to_string(&self, path: &Path) -> Result<String>;
    /// Replace `path` with `content` in one step. The data is never visible
    /// at `path` with a mode other than `mode`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or moved into place.
    fn write_private(&self, path: &Path, content: &str, mode: u32) -> Result<()>;
    /// # Errors
    ///
    /// Returns an error if `path` does not exist.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;
    /// Recursively copy `from` into `to`, skipping entries whose file name
    /// matches `exclude`. Returns the number of files copied.
    ///
    /// # Errors
    ///
    /// Returns an error on the first entry that cannot be copied.
    fn copy_tree(&self, from: &Path, to: &Path, exclude: fn(&str) -> bool) -> Result<u64>;
}

// ── Host Ports ────────────────────────────────────────────────────────────────

/// Read-only facts about the host.
#[allow(async_fn_in_trait)]
pub trait HostInspector {
    /// Raw `os-release` content.
    ///
    /// # Errors
    ///
    /// Returns an error if no os-release file can be read.
    fn os_release(&self) -> Result<String>;
    /// Effective user ID of this process.
    async fn effective_uid(&self) -> Result<u32>;
    /// Login name of this process's user.
    async fn login_name(&self) -> Result<String>;
    /// Whether `sudo` is installed.
    async fn sudo_available(&self) -> bool;
}

/// User account queries and ownership changes.
#[allow(async_fn_in_trait)]
pub trait Accounts {
    async fn user_exists(&self, user: &str) -> Result<bool>;
    async fn primary_group(&self, user: &str) -> Result<String>;
    /// `(user, group)` owning `path`.
    async fn owner_of(&self, path: &Path) -> Result<(String, String)>;
    async fn chown_recursive(&self, path: &Path, user: &str, group: &str) -> Result<()>;
}

/// OS package installation.
#[allow(async_fn_in_trait)]
pub trait PackageManager {
    /// Install `packages`. Already-installed packages are a no-op.
    async fn install(&self, packages: &[String]) -> Result<()>;
}

/// Isolated Python runtime for the bot.
#[allow(async_fn_in_trait)]
pub trait RuntimeEnv {
    /// Create a virtual environment at `venv`.
    async fn create(&self, venv: &Path) -> Result<()>;
    /// Install `manifest` into the environment at `venv`.
    async fn install_requirements(&self, venv: &Path, manifest: &Path) -> Result<()>;
}

/// Git operations.
#[allow(async_fn_in_trait)]
pub trait VersionControl {
    /// Clone `url` at `branch` into `dest`. When `credentials` are given they
    /// are supplied through a temporary askpass helper.
    async fn clone_repo(
        &self,
        url: &str,
        branch: &str,
        dest: &Path,
        credentials: Option<&GitCredentials>,
    ) -> Result<()>;
    /// URL of the `origin` remote, `None` if it has none.
    async fn remote_url(&self, repo: &Path) -> Result<Option<String>>;
    async fn set_remote_url(&self, repo: &Path, url: &str) -> Result<()>;
}

/// Host service manager (systemd).
#[allow(async_fn_in_trait)]
pub trait ServiceManager {
    /// Write `content` to `unit_path` with mode 0644.
    async fn install_unit(&self, unit_path: &Path, content: &str) -> Result<()>;
    async fn reload(&self) -> Result<()>;
    async fn enable(&self, name: &str) -> Result<()>;
    async fn restart(&self, name: &str) -> Result<()>;
}

// ── Source Acquisition Port ───────────────────────────────────────────────────

/// Strategy that fills an empty target directory with the bot's code.
#[allow(async_fn_in_trait)]
pub trait SourceAcquirer {
    /// Short description for progress output.
    fn describe(&self) -> String;
    /// Checks that can fail before anything on the host is mutated.
    async fn preflight(&self, target: &Path) -> Result<()>;
    /// Populate `target`, which exists and is empty.
    async fn acquire(&self, target: &Path) -> Result<()>;
}
