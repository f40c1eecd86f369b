//! Infrastructure implementation of the `Prompter` port using dialoguer.

use anyhow::{Context, Result};
use dialoguer::{Input, Password};

use crate::application::ports::Prompter;
use crate::domain::plan::parse_confirmation;

/// Terminal prompter. Defaults are rendered as `[value]`; an empty answer is
/// returned as-is and interpreted by the caller.
pub struct DialoguerPrompter;

/// `"Label [default]"`, or just the label without a default.
#[must_use]
pub fn prompt_text(prompt: &str, default: Option<&str>) -> String {
    match default {
        Some(default) => format!("{prompt} [{default}]"),
        None => prompt.to_string(),
    }
}

/// Yes/no hint for a confirmation with the given default.
#[must_use]
pub fn confirm_hint(default: bool) -> &'static str {
    if default { "Y/n" } else { "y/N" }
}

impl Prompter for DialoguerPrompter {
    fn input(&self, prompt: &str, default: Option<&str>) -> Result<String> {
        Input::<String>::new()
            .with_prompt(prompt_text(prompt, default))
            .allow_empty(true)
            .interact_text()
            .context("reading answer from terminal")
    }

    fn secret(&self, prompt: &str) -> Result<String> {
        Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
            .context("reading secret from terminal")
    }

    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        let answer = Input::<String>::new()
            .with_prompt(prompt_text(prompt, Some(confirm_hint(default))))
            .allow_empty(true)
            .interact_text()
            .context("reading confirmation from terminal")?;
        Ok(parse_confirmation(&answer, default))
    }
}
