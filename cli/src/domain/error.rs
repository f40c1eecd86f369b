//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::path::PathBuf;

use thiserror::Error;

// ── Install errors ────────────────────────────────────────────────────────────

/// Every failure that terminates an install or autostart run.
///
/// Grouped the way they are reported: environment mismatch, missing
/// precondition, user-declined action, and external command failure.
#[derive(Debug, Error)]
pub enum InstallError {
    // Environment mismatch
    #[error("Unsupported operating system '{0}'. Only Ubuntu is supported.")]
    UnsupportedOs(String),

    #[error("Root privileges are required. Run as root or install sudo.")]
    NoPrivilegeEscalation,

    // Missing precondition artifacts
    #[error("Dependency manifest not found: {}", .0.display())]
    ManifestMissing(PathBuf),

    #[error("Secrets file not found: {}. Run 'zavod-install install' first.", .0.display())]
    SecretsFileMissing(PathBuf),

    #[error("Installation directory not found: {}", .0.display())]
    InstallDirMissing(PathBuf),

    #[error("Python runtime not found: {}. Run 'zavod-install install' first.", .0.display())]
    RuntimeMissing(PathBuf),

    #[error("User '{0}' does not exist.")]
    UnknownUser(String),

    #[error("Source directory not found: {}", .0.display())]
    SourceMissing(PathBuf),

    #[error("Source {} and target {} overlap.", .from.display(), .into.display())]
    SourceTargetOverlap { from: PathBuf, into: PathBuf },

    // User-declined actions
    #[error("Directory {} is not empty and was not cleared. Aborting.", .0.display())]
    DirectoryNotCleared(PathBuf),

    #[error("Installation cancelled.")]
    Declined,

    // External command failures
    #[error("{command} failed with {status}")]
    CommandFailed { command: String, status: String },

    #[error("Interrupted.")]
    Interrupted,
}

// ── Unit rendering errors ─────────────────────────────────────────────────────

/// Values that cannot be represented in a systemd unit file.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnitError {
    #[error("Invalid service name '{0}': use letters, digits, ':', '_', '.', '@' or '-'")]
    InvalidName(String),

    #[error("Value for {key} contains a control character")]
    ControlCharacter { key: String },

    #[error("ExecStart needs at least one argument")]
    EmptyCommand,
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}\n\nValid values: {valid}")]
    InvalidValue {
        key: String,
        value: String,
        valid: String,
    },
}
