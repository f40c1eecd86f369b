//! Domain types and validators for installer configuration.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use std::path::{Component, Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;
use crate::domain::unit::validate_service_name;

// ── Constants ────────────────────────────────────────────────────────────────

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_SERVICE_NAME: &str = "zavod-bot";
pub const DEFAULT_ENTRY_POINT: &str = "bot.py";
pub const DEFAULT_INSTALL_DIR_NAME: &str = "zavod";
pub const DEFAULT_PACKAGES: &[&str] = &["python3", "python3-venv", "python3-pip", "git"];

// ── Config schema ────────────────────────────────────────────────────────────

/// Installer preferences stored in `~/.config/zavod-installer/config.yaml`.
///
/// Every run writes the resolved install directory and repository back so the
/// next run can offer them as prompt defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    /// Last used installation directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_dir: Option<PathBuf>,
    /// Source repository coordinates.
    pub repository: RepositoryConfig,
    /// Service registration settings.
    pub service: ServiceConfig,
    /// OS packages installed before provisioning.
    pub packages: Vec<String>,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            install_dir: None,
            repository: RepositoryConfig::default(),
            service: ServiceConfig::default(),
            packages: DEFAULT_PACKAGES.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Repository settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Git URL or local directory the bot is installed from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Branch checked out when cloning.
    pub branch: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            url: None,
            branch: DEFAULT_BRANCH.to_string(),
        }
    }
}

/// Service unit settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// systemd unit name, without the `.service` suffix.
    pub name: String,
    /// Account the service runs as. Defaults to the invoking user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Script started by the unit, relative to the install directory.
    pub entry_point: String,
    /// What to do when the install directory is owned by someone else.
    pub ownership: OwnershipPolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SERVICE_NAME.to_string(),
            user: None,
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            ownership: OwnershipPolicy::default(),
        }
    }
}

/// Policy for reconciling install directory ownership with the service user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OwnershipPolicy {
    /// Ask before changing ownership; leave it alone when declined.
    #[default]
    Confirm,
    /// Change ownership whenever it diverges.
    Always,
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates values that YAML deserialization alone cannot check.
///
/// # Errors
///
/// Returns an error if the service name is not a valid unit name, the entry
/// point escapes the install directory, or the package list is empty.
pub fn validate_config(config: &InstallerConfig) -> Result<()> {
    validate_service_name(&config.service.name)?;
    validate_entry_point(&config.service.entry_point)?;
    if config.packages.iter().all(|p| p.trim().is_empty()) {
        return Err(ConfigError::InvalidValue {
            key: "packages".to_string(),
            value: "[]".to_string(),
            valid: "at least one package name".to_string(),
        }
        .into());
    }
    Ok(())
}

fn validate_entry_point(entry: &str) -> Result<()> {
    let path = Path::new(entry);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if entry.is_empty() || escapes {
        return Err(ConfigError::InvalidValue {
            key: "service.entry_point".to_string(),
            value: entry.to_string(),
            valid: "a relative path inside the install directory".to_string(),
        }
        .into());
    }
    Ok(())
}

// ── Unit tests ───────────────────────────────────────────────────────────────
