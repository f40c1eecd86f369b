//! Application context: unified state passed to every command handler.
//!
//! Holds the adapters that do not depend on the probed host. Adapters that
//! need the elevation strategy are built by the commands after probing.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::services::configure::ConfigureDefaults;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::YamlConfigStore;
use crate::infra::fs::LocalFs;
use crate::infra::host::SystemHost;
use crate::infra::prompt::DialoguerPrompter;
use crate::output::OutputContext;

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    pub config: YamlConfigStore,
    pub fs: LocalFs,
    pub prompter: DialoguerPrompter,
    pub host: SystemHost<TokioCommandRunner>,
    /// `SUDO_USER` of the invoking shell, if any.
    pub sudo_user: Option<String>,
    /// Home directory and working directory for prompt defaults.
    pub defaults: ConfigureDefaults,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the home or working directory cannot be determined.
    pub fn new(flags: &AppFlags) -> Result<Self> {
        let home: PathBuf =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        let cwd = std::env::current_dir().context("cannot determine working directory")?;

        Ok(Self {
            output: OutputContext::new(flags.no_color, flags.quiet),
            config: YamlConfigStore,
            fs: LocalFs,
            prompter: DialoguerPrompter,
            host: SystemHost::new(TokioCommandRunner::default()),
            sudo_user: std::env::var("SUDO_USER").ok(),
            defaults: ConfigureDefaults { home, cwd },
        })
    }
}
