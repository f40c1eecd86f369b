//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags};
use crate::commands;

/// Install the Zavod Discord bot on Ubuntu and register it with systemd
#[derive(Parser)]
#[command(name = "zavod-install", version, propagate_version = true)]
pub struct Cli {
    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Install packages, code, Python environment and secrets (default)
    Install,

    /// Register an existing installation as a systemd service
    Autostart,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails or the user declines.
    pub async fn run(self) -> Result<()> {
        let Cli {
            quiet,
            no_color,
            verbose: _,
            command,
        } = self;
        let app = AppContext::new(&AppFlags { no_color, quiet })?;
        match command.unwrap_or(Command::Install) {
            Command::Install => commands::install::run(&app).await,
            Command::Autostart => commands::autostart::run(&app).await,
        }
    }
}
