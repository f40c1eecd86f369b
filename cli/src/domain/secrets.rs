//! The bot's `.env` secrets file: an ordered list of `KEY=VALUE` lines.
//!
//! Unrecognized lines, comments and blank lines are kept verbatim so that
//! upserting the installer's keys never disturbs anything else in the file.

use anyhow::Result;

pub const SECRETS_FILE_NAME: &str = ".env";

pub const DISCORD_TOKEN: &str = "DISCORD_TOKEN";
pub const GITHUB_USERNAME: &str = "GITHUB_USERNAME";
pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const BOT_AUTO_RESTART: &str = "BOT_AUTO_RESTART";

/// Owner-only read/write.
pub const SECRETS_FILE_MODE: u32 = 0o600;

/// In-memory copy of a secrets file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretsFile {
    lines: Vec<String>,
}

impl SecretsFile {
    /// Parse file content. Never fails: lines that are not entries are kept
    /// as opaque text.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        Self {
            lines: content.lines().map(str::to_string).collect(),
        }
    }

    /// Value of the first entry named `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines
            .iter()
            .filter_map(|line| parse_entry(line))
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Like [`get`](Self::get) but treats an empty value as absent.
    #[must_use]
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// Replace every `key=` entry in place, or append one if none exists.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` or `value` would break the line format.
    pub fn upsert(&mut self, key: &str, value: &str) -> Result<()> {
        anyhow::ensure!(
            !key.is_empty() && !key.contains(['=', '#']) && key.trim() == key,
            "invalid secrets key '{key}'"
        );
        anyhow::ensure!(
            !key.contains(['\n', '\r']) && !value.contains(['\n', '\r']),
            "value for {key} must be a single line"
        );

        let replacement = format!("{key}={value}");
        let mut found = false;
        for line in &mut self.lines {
            if parse_entry(line).is_some_and(|(k, _)| k == key) {
                line.clone_from(&replacement);
                found = true;
            }
        }
        if !found {
            self.lines.push(replacement);
        }
        Ok(())
    }

    /// Entry keys in file order, duplicates included.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|l| parse_entry(l)).map(|(k, _)| k)
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Serialize back to file content, newline-terminated.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// Split an entry line into `(key, value)`. Blank lines, `#` comments and
/// lines without `=` or with an empty key yield `None`.
fn parse_entry(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim()))
}

/// Hide a secret for display, keeping at most its last four characters.
#[must_use]
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 8 {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("****{tail}")
}
