//! Resolved install parameters and the fixed layout of an install directory.

use std::path::{Component, Path, PathBuf};

use crate::domain::credentials::GitCredentials;
use crate::domain::secrets::{SECRETS_FILE_NAME, SecretsFile};

/// Dependency manifest, relative to the install directory.
pub const MANIFEST_FILE: &str = "requirements.txt";
/// Virtual environment directory, relative to the install directory.
pub const VENV_DIR: &str = ".venv";

/// Names never copied from a local source tree.
pub const COPY_EXCLUDED_NAMES: &[&str] = &[
    ".venv",
    "venv",
    "env",
    "__pycache__",
    ".pytest_cache",
    ".mypy_cache",
    "install.sh",
    "install_local.sh",
    "autostart.sh",
    "zavod-install",
];
/// File suffixes never copied from a local source tree.
pub const COPY_EXCLUDED_SUFFIXES: &[&str] = &[".pyc"];

/// Returns `true` if a directory entry called `name` is a transient artifact.
#[must_use]
pub fn is_copy_excluded(name: &str) -> bool {
    COPY_EXCLUDED_NAMES.contains(&name)
        || COPY_EXCLUDED_SUFFIXES.iter().any(|s| name.ends_with(s))
}

/// Where the bot's code comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Clone `url` at `branch`.
    Git { url: String, branch: String },
    /// Copy an existing local tree.
    Local { path: PathBuf },
}

impl Source {
    /// Classify a source answer: an existing directory means copy,
    /// anything else is treated as a git URL.
    #[must_use]
    pub fn classify(answer: &str, is_dir: bool, branch: &str) -> Self {
        if is_dir {
            Self::Local {
                path: PathBuf::from(answer),
            }
        } else {
            Self::Git {
                url: answer.to_string(),
                branch: branch.to_string(),
            }
        }
    }

    /// Value persisted as `repository.url`.
    #[must_use]
    pub fn location(&self) -> String {
        match self {
            Self::Git { url, .. } => url.clone(),
            Self::Local { path } => path.display().to_string(),
        }
    }
}

/// Paths derived from the install directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    pub root: PathBuf,
}

impl InstallLayout {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn secrets_file(&self) -> PathBuf {
        self.root.join(SECRETS_FILE_NAME)
    }

    #[must_use]
    pub fn manifest(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    #[must_use]
    pub fn venv(&self) -> PathBuf {
        self.root.join(VENV_DIR)
    }

    #[must_use]
    pub fn python(&self) -> PathBuf {
        self.venv().join("bin").join("python")
    }

    #[must_use]
    pub fn git_dir(&self) -> PathBuf {
        self.root.join(".git")
    }
}

/// Everything the configurator resolved. Built once and passed by reference.
#[derive(Debug, Clone)]
pub struct InstallPlan {
    pub layout: InstallLayout,
    pub source: Source,
    pub discord_token: String,
    pub credentials: Option<GitCredentials>,
    /// Secrets file content found before provisioning, if any.
    pub existing_secrets: Option<SecretsFile>,
}

/// Interpret a confirmation answer: a lone `y`/`Y` is yes, a lone `n`/`N`
/// is no, and anything else (including blank) is `default`.
#[must_use]
pub fn parse_confirmation(answer: &str, default: bool) -> bool {
    match answer.trim() {
        "y" | "Y" => true,
        "n" | "N" => false,
        _ => default,
    }
}

/// `true` when `target` equals `source` or lies beneath it. Both paths are
/// compared after lexical normalization.
#[must_use]
pub fn is_within(target: &Path, source: &Path) -> bool {
    normalize_path(target).starts_with(normalize_path(source))
}

/// Resolve `.` and `..` components without touching the filesystem.
/// A `..` at the root stays at the root; leading `..` of a relative path is
/// kept.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
