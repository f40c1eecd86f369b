//! Application service: interactive configuration.
//!
//! Every prompt offers a default taken from the stored installer config, the
//! existing secrets file, or the environment. Imports only from
//! `crate::domain` and `crate::application::ports`.

use std::path::PathBuf;

use anyhow::Result;

use crate::application::ports::{LocalFs, ProgressReporter, Prompter};
use crate::application::services::secrets::load_secrets;
use crate::domain::config::{DEFAULT_INSTALL_DIR_NAME, InstallerConfig};
use crate::domain::credentials::{CredentialResolution, resolve_credentials};
use crate::domain::error::InstallError;
use crate::domain::plan::{InstallLayout, InstallPlan, MANIFEST_FILE, Source, normalize_path};
use crate::domain::secrets::{DISCORD_TOKEN, GITHUB_TOKEN, GITHUB_USERNAME, mask_secret};

/// Environment facts used to derive prompt defaults.
#[derive(Debug, Clone)]
pub struct ConfigureDefaults {
    pub home: PathBuf,
    pub cwd: PathBuf,
}

// ── Prompt primitives ─────────────────────────────────────────────────────────

/// Ask until a non-blank answer is given. A default counts as an answer.
///
/// # Errors
///
/// Returns an error if the prompter fails.
pub fn ask_required(prompter: &impl Prompter, label: &str, default: Option<&str>) -> Result<String> {
    let default = default.filter(|d| !d.trim().is_empty());
    loop {
        let answer = prompter.input(label, default)?;
        let answer = answer.trim();
        if !answer.is_empty() {
            return Ok(answer.to_string());
        }
        if let Some(default) = default {
            return Ok(default.to_string());
        }
    }
}

/// Ask once; blank means the default, or `None` without one.
///
/// # Errors
///
/// Returns an error if the prompter fails.
pub fn ask_optional(
    prompter: &impl Prompter,
    label: &str,
    default: Option<&str>,
) -> Result<Option<String>> {
    let default = default.filter(|d| !d.trim().is_empty());
    let answer = prompter.input(label, default)?;
    let answer = answer.trim();
    if answer.is_empty() {
        return Ok(default.map(str::to_string));
    }
    Ok(Some(answer.to_string()))
}

/// Ask for a secret that may be left empty. Blank keeps `existing`.
///
/// # Errors
///
/// Returns an error if the prompter fails.
pub fn ask_secret_optional(
    prompter: &impl Prompter,
    label: &str,
    existing: Option<&str>,
) -> Result<Option<String>> {
    let existing = existing.filter(|e| !e.is_empty());
    let answer = prompter.secret(&secret_label(label, existing.is_some()))?;
    let answer = answer.trim();
    if answer.is_empty() {
        return Ok(existing.map(str::to_string));
    }
    Ok(Some(answer.to_string()))
}

/// Ask for a secret that must be set. Blank keeps `existing`; without one
/// the prompt repeats.
///
/// # Errors
///
/// Returns an error if the prompter fails.
pub fn ask_secret_required(
    prompter: &impl Prompter,
    label: &str,
    existing: Option<&str>,
) -> Result<String> {
    let existing = existing.filter(|e| !e.is_empty());
    let prompt = secret_label(label, existing.is_some());
    loop {
        let answer = prompter.secret(&prompt)?;
        let answer = answer.trim();
        if !answer.is_empty() {
            return Ok(answer.to_string());
        }
        if let Some(existing) = existing {
            return Ok(existing.to_string());
        }
    }
}

fn secret_label(label: &str, has_existing: bool) -> String {
    if has_existing {
        format!("{label} (leave blank to keep current)")
    } else {
        label.to_string()
    }
}

/// Expand `~`, make relative answers absolute against `cwd` and fold away
/// `.` and `..`.
#[must_use]
pub fn resolve_path(answer: &str, defaults: &ConfigureDefaults) -> PathBuf {
    let expanded = if answer == "~" {
        defaults.home.clone()
    } else if let Some(rest) = answer.strip_prefix("~/") {
        defaults.home.join(rest)
    } else {
        PathBuf::from(answer)
    };
    if expanded.is_absolute() {
        normalize_path(&expanded)
    } else {
        normalize_path(&defaults.cwd.join(expanded))
    }
}

// ── Use-cases ─────────────────────────────────────────────────────────────────

/// Ask for the install directory, defaulting to the stored one or `~/zavod`.
///
/// # Errors
///
/// Returns an error if the prompter fails.
pub fn ask_install_dir(
    prompter: &impl Prompter,
    config: &InstallerConfig,
    defaults: &ConfigureDefaults,
) -> Result<InstallLayout> {
    let default = config
        .install_dir
        .clone()
        .unwrap_or_else(|| defaults.home.join(DEFAULT_INSTALL_DIR_NAME));
    let default = default.display().to_string();
    let answer = ask_required(prompter, "Installation directory", Some(default.as_str()))?;
    Ok(InstallLayout::new(resolve_path(&answer, defaults)))
}

/// Collect everything the install pipeline needs.
///
/// # Errors
///
/// Returns [`InstallError::Declined`] if the summary is not confirmed, or an
/// error if prompting or reading the existing secrets file fails.
pub fn configure_install(
    prompter: &impl Prompter,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
    config: &InstallerConfig,
    defaults: &ConfigureDefaults,
) -> Result<InstallPlan> {
    let layout = ask_install_dir(prompter, config, defaults)?;
    let existing = load_secrets(fs, &layout.secrets_file())?;
    if existing.is_some() {
        reporter.info(&format!(
            "Using defaults from {}",
            layout.secrets_file().display()
        ));
    }

    let source = ask_source(prompter, fs, config, defaults)?;

    let stored = |key: &str| existing.as_ref().and_then(|s| s.get_non_empty(key));
    let username = ask_optional(prompter, "GitHub username", stored(GITHUB_USERNAME))?;
    let token = ask_secret_optional(prompter, "GitHub token", stored(GITHUB_TOKEN))?;
    let credentials = match resolve_credentials(username.as_deref(), token.as_deref()) {
        CredentialResolution::Discarded => {
            reporter.warn("GitHub username and token must both be set; ignoring both.");
            None
        }
        resolution => resolution.into_credentials(),
    };

    let discord_token = ask_secret_required(prompter, "Discord bot token", stored(DISCORD_TOKEN))?;

    let plan = InstallPlan {
        layout,
        source,
        discord_token,
        credentials,
        existing_secrets: existing,
    };
    print_summary(reporter, &plan);

    if !prompter.confirm("Proceed with installation?", true)? {
        return Err(InstallError::Declined.into());
    }
    Ok(plan)
}

/// Ask where the code comes from. An existing directory selects the copy
/// strategy; anything else is cloned.
fn ask_source(
    prompter: &impl Prompter,
    fs: &impl LocalFs,
    config: &InstallerConfig,
    defaults: &ConfigureDefaults,
) -> Result<Source> {
    let discovered = fs
        .exists(&defaults.cwd.join(MANIFEST_FILE))
        .then(|| defaults.cwd.display().to_string());
    let default = config.repository.url.clone().or(discovered);

    let answer = ask_required(prompter, "Repository URL or local directory", default.as_deref())?;
    let local = looks_local(&answer).then(|| resolve_path(&answer, defaults));
    if let Some(path) = local.filter(|p| fs.is_dir(p)) {
        return Ok(Source::Local { path });
    }

    let branch = ask_optional(prompter, "Branch", Some(config.repository.branch.as_str()))?
        .unwrap_or_else(|| config.repository.branch.clone());
    Ok(Source::classify(&answer, false, &branch))
}

fn looks_local(answer: &str) -> bool {
    !answer.contains("://") && !answer.starts_with("git@")
}

fn print_summary(reporter: &impl ProgressReporter, plan: &InstallPlan) {
    reporter.info(&format!("Install directory: {}", plan.layout.root.display()));
    match &plan.source {
        Source::Git { url, branch } => reporter.info(&format!("Source: {url} ({branch})")),
        Source::Local { path } => reporter.info(&format!("Source: copy of {}", path.display())),
    }
    match &plan.credentials {
        Some(creds) => reporter.info(&format!(
            "GitHub: {} / {}",
            creds.username,
            mask_secret(&creds.token)
        )),
        None => reporter.info("GitHub: anonymous"),
    }
    reporter.info(&format!(
        "Discord token: {}",
        mask_secret(&plan.discord_token)
    ));
}

/// Record the answers that become next run's defaults: install directory,
/// source location, and branch when cloning.
pub fn remember_choices(config: &mut InstallerConfig, plan: &InstallPlan) {
    config.install_dir = Some(plan.layout.root.clone());
    config.repository.url = Some(plan.source.location());
    if let Source::Git { branch, .. } = &plan.source {
        config.repository.branch.clone_from(branch);
    }
}
