//! GitHub credential pair and the askpass script that feeds it to git.

use std::fmt;

/// A complete GitHub username/token pair.
#[derive(Clone, PartialEq, Eq)]
pub struct GitCredentials {
    pub username: String,
    pub token: String,
}

impl fmt::Debug for GitCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitCredentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Outcome of combining the two optional credential halves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialResolution {
    /// Both halves supplied.
    Complete(GitCredentials),
    /// Neither half supplied.
    Absent,
    /// Only one half supplied; both were dropped.
    Discarded,
}

impl CredentialResolution {
    #[must_use]
    pub fn into_credentials(self) -> Option<GitCredentials> {
        match self {
            Self::Complete(creds) => Some(creds),
            Self::Absent | Self::Discarded => None,
        }
    }
}

/// Combine username and token. Blank values count as absent, and a pair with
/// only one half is never returned.
#[must_use]
pub fn resolve_credentials(username: Option<&str>, token: Option<&str>) -> CredentialResolution {
    let username = username.map(str::trim).filter(|s| !s.is_empty());
    let token = token.map(str::trim).filter(|s| !s.is_empty());
    match (username, token) {
        (Some(username), Some(token)) => CredentialResolution::Complete(GitCredentials {
            username: username.to_string(),
            token: token.to_string(),
        }),
        (None, None) => CredentialResolution::Absent,
        _ => CredentialResolution::Discarded,
    }
}

/// Quote a value for POSIX `sh` using single quotes.
#[must_use]
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Render a `GIT_ASKPASS` helper that answers username prompts with the
/// username and every other prompt with the token.
#[must_use]
pub fn askpass_script(creds: &GitCredentials) -> String {
    format!(
        "#!/bin/sh\n\
         case \"$1\" in\n\
         \x20   *Username*|*username*)\n\
         \x20       printf '%s\\n' {user}\n\
         \x20       ;;\n\
         \x20   *)\n\
         \x20       printf '%s\\n' {token}\n\
         \x20       ;;\n\
         esac\n",
        user = shell_quote(&creds.username),
        token = shell_quote(&creds.token),
    )
}
