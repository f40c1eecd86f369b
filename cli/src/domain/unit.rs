//! systemd service unit model and renderer.
//!
//! The unit is built as structured sections and serialized in one place, so
//! quoting and `%` specifier escaping are never done ad hoc by callers.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::domain::error::UnitError;
use crate::domain::secrets::SECRETS_FILE_NAME;

/// Directory systemd loads administrator units from.
pub const SYSTEMD_UNIT_DIR: &str = "/etc/systemd/system";

/// Validates a unit name (without the `.service` suffix).
///
/// # Errors
///
/// Returns [`UnitError::InvalidName`] for empty names or names with
/// characters systemd does not accept.
pub fn validate_service_name(name: &str) -> Result<(), UnitError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ':' | '_' | '.' | '@' | '-'));
    if valid {
        Ok(())
    } else {
        Err(UnitError::InvalidName(name.to_string()))
    }
}

/// Written to `Restart=`.
pub const RESTART_POLICY: &str = "on-failure";

/// Everything the bot's service unit embeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUnit {
    pub name: String,
    pub description: String,
    pub user: String,
    pub group: String,
    pub working_directory: PathBuf,
    pub environment_file: PathBuf,
    /// Program followed by its arguments.
    pub exec_start: Vec<String>,
    pub restart_sec: u32,
}

impl ServiceUnit {
    /// Unit for a bot installed in `install_dir`, started with the venv
    /// interpreter `python` running `entry_point`.
    #[must_use]
    pub fn for_install(
        name: &str,
        install_dir: &Path,
        python: &Path,
        entry_point: &str,
        user: &str,
        group: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: format!("Zavod Discord bot ({name})"),
            user: user.to_string(),
            group: group.to_string(),
            working_directory: install_dir.to_path_buf(),
            environment_file: install_dir.join(SECRETS_FILE_NAME),
            exec_start: vec![
                python.display().to_string(),
                install_dir.join(entry_point).display().to_string(),
            ],
            restart_sec: 5,
        }
    }

    /// `<name>.service`
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.service", self.name)
    }

    /// Absolute path of the installed unit.
    #[must_use]
    pub fn install_path(&self) -> PathBuf {
        Path::new(SYSTEMD_UNIT_DIR).join(self.file_name())
    }

    /// Structured unit file with `[Unit]`, `[Service]` and `[Install]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid, `exec_start` is empty, or any
    /// value contains a control character.
    pub fn to_unit_file(&self) -> Result<UnitFile, UnitError> {
        validate_service_name(&self.name)?;
        if self.exec_start.is_empty() {
            return Err(UnitError::EmptyCommand);
        }

        let exec = self
            .exec_start
            .iter()
            .map(|arg| quote_exec_arg(arg))
            .collect::<Vec<_>>()
            .join(" ");

        let mut unit = UnitSection::new("Unit");
        unit.set("Description", escape_specifiers(&self.description));
        unit.set("After", "network-online.target".to_string());
        unit.set("Wants", "network-online.target".to_string());

        let mut service = UnitSection::new("Service");
        service.set("Type", "simple".to_string());
        service.set("User", escape_specifiers(&self.user));
        service.set("Group", escape_specifiers(&self.group));
        service.set(
            "WorkingDirectory",
            escape_specifiers(&self.working_directory.display().to_string()),
        );
        service.set(
            "EnvironmentFile",
            escape_specifiers(&self.environment_file.display().to_string()),
        );
        service.set("ExecStart", exec);
        service.set("Restart", RESTART_POLICY.to_string());
        service.set("RestartSec", self.restart_sec.to_string());

        let mut install = UnitSection::new("Install");
        install.set("WantedBy", "multi-user.target".to_string());

        let file = UnitFile {
            comments: Vec::new(),
            sections: vec![unit, service, install],
        };
        file.check()?;
        Ok(file)
    }
}

/// One `[Section]` with ordered `Key=Value` entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSection {
    pub name: &'static str,
    pub entries: Vec<(String, String)>,
}

impl UnitSection {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Vec::new(),
        }
    }

    pub fn set(&mut self, key: &str, value: String) {
        self.entries.push((key.to_string(), value));
    }
}

/// A complete unit file ready to be serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFile {
    /// Leading `#` comment lines.
    pub comments: Vec<String>,
    pub sections: Vec<UnitSection>,
}

impl UnitFile {
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comments.push(comment.into());
        self
    }

    fn check(&self) -> Result<(), UnitError> {
        for section in &self.sections {
            for (key, value) in &section.entries {
                if value.chars().any(char::is_control) {
                    return Err(UnitError::ControlCharacter { key: key.clone() });
                }
            }
        }
        Ok(())
    }

    /// Serialize to systemd's INI-like syntax.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for comment in &self.comments {
            let comment: String = comment.chars().filter(|c| !c.is_control()).collect();
            let _ = writeln!(out, "# {comment}");
        }
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 || !self.comments.is_empty() {
                out.push('\n');
            }
            let _ = writeln!(out, "[{}]", section.name);
            for (key, value) in &section.entries {
                let _ = writeln!(out, "{key}={value}");
            }
        }
        out
    }
}

/// Escape `%` so systemd does not expand it as a specifier.
fn escape_specifiers(value: &str) -> String {
    value.replace('%', "%%")
}

/// Quote one `ExecStart=` argument when it contains characters systemd
/// would otherwise split or interpret.
fn quote_exec_arg(arg: &str) -> String {
    let needs_quotes = arg.is_empty()
        || arg
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '\\' | ';' | '$'));
    let escaped = escape_specifiers(arg);
    if !needs_quotes {
        return escaped;
    }
    let mut quoted = String::with_capacity(escaped.len() + 2);
    quoted.push('"');
    for c in escaped.chars() {
        match c {
            '"' | '\\' => {
                quoted.push('\\');
                quoted.push(c);
            }
            '$' => quoted.push_str("$$"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
