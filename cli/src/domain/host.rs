//! Host identity: OS release, privilege elevation, invoking user.
//!
//! `HostContext` is resolved once by the environment prober and then passed
//! by reference to every later stage.

use std::collections::HashMap;

use crate::domain::error::InstallError;

/// Distribution IDs accepted by the installer.
pub const SUPPORTED_DISTRIBUTIONS: &[&str] = &["ubuntu"];

/// Parsed `/etc/os-release`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsRelease {
    fields: HashMap<String, String>,
}

impl OsRelease {
    /// Parse `os-release(5)` content. Values may be bare, single- or
    /// double-quoted; malformed lines are skipped.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let fields = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .filter_map(|l| l.split_once('='))
            .map(|(k, v)| (k.trim().to_string(), unquote(v.trim())))
            .collect();
        Self { fields }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        self.fields.get("ID").map_or("linux", String::as_str)
    }

    #[must_use]
    pub fn pretty_name(&self) -> &str {
        self.fields
            .get("PRETTY_NAME")
            .map_or_else(|| self.id(), String::as_str)
    }

    fn id_like(&self) -> impl Iterator<Item = &str> {
        self.fields
            .get("ID_LIKE")
            .map(String::as_str)
            .unwrap_or_default()
            .split_whitespace()
    }

    /// `true` for Ubuntu and distributions declaring `ID_LIKE=ubuntu`.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        let id = self.id().to_ascii_lowercase();
        SUPPORTED_DISTRIBUTIONS.contains(&id.as_str())
            || self
                .id_like()
                .any(|like| SUPPORTED_DISTRIBUTIONS.contains(&like.to_ascii_lowercase().as_str()))
    }

    /// # Errors
    ///
    /// Returns [`InstallError::UnsupportedOs`] when not in the Ubuntu family.
    pub fn ensure_supported(&self) -> Result<(), InstallError> {
        if self.is_supported() {
            Ok(())
        } else {
            Err(InstallError::UnsupportedOs(self.pretty_name().to_string()))
        }
    }
}

fn unquote(value: &str) -> String {
    let stripped = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')));
    match stripped {
        Some(inner) => inner.replace("\\\"", "\"").replace("\\\\", "\\"),
        None => value.to_string(),
    }
}

/// How privileged commands are run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elevation {
    /// Already root; run commands directly.
    Root,
    /// Prefix privileged commands with `sudo`.
    Sudo,
}

impl Elevation {
    /// Build the argv for a privileged invocation of `program`.
    #[must_use]
    pub fn command(self, program: &str, args: &[&str]) -> (String, Vec<String>) {
        match self {
            Self::Root => (
                program.to_string(),
                args.iter().map(ToString::to_string).collect(),
            ),
            Self::Sudo => (
                "sudo".to_string(),
                std::iter::once(program)
                    .chain(args.iter().copied())
                    .map(ToString::to_string)
                    .collect(),
            ),
        }
    }

    /// Human-readable prefix for manual instructions (`"sudo "` or `""`).
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Root => "",
            Self::Sudo => "sudo ",
        }
    }
}

/// Immutable facts about the host the installer runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostContext {
    pub os: OsRelease,
    pub elevation: Elevation,
    /// Login of the user who started the installer (`SUDO_USER` when root).
    pub invoking_user: String,
}
