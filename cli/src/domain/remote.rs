//! Git remote URL normalization for the bot's self-update.
//!
//! The bot pulls over HTTPS with an askpass helper, so SSH-style GitHub
//! remotes are rewritten and the GitHub username is placed in the authority.

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)] // Patterns are compile-time constants
static GITHUB_SSH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:ssh://)?git@github\.com[:/](?P<path>[^\s]+)$").expect("valid regex")
});

#[allow(clippy::expect_used)]
static HTTPS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<scheme>https?)://(?:[^@/]*@)?(?P<rest>[^\s]+)$").expect("valid regex")
});

#[allow(clippy::expect_used)]
static GITHUB_USERNAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,38})$").expect("valid regex")
});

/// Returns `true` if `name` can be embedded in a URL authority unescaped.
#[must_use]
pub fn is_valid_github_username(name: &str) -> bool {
    GITHUB_USERNAME.is_match(name)
}

/// Rewrite `url` for HTTPS access.
///
/// - `git@github.com:org/repo.git` and `ssh://git@github.com/org/repo.git`
///   become `https://github.com/org/repo.git`.
/// - When `username` is given, it replaces any user info already embedded
///   in an HTTP(S) URL (including a stored password).
/// - Anything else is returned unchanged.
#[must_use]
pub fn rewrite_remote_url(url: &str, username: Option<&str>) -> String {
    let url = url.trim();
    let https = match GITHUB_SSH.captures(url) {
        Some(caps) => format!("https://github.com/{}", &caps["path"]),
        None => url.to_string(),
    };

    let Some(username) = username.filter(|u| is_valid_github_username(u)) else {
        return https;
    };

    match HTTPS_URL.captures(&https) {
        Some(caps) => format!("{}://{username}@{}", &caps["scheme"], &caps["rest"]),
        None => https,
    }
}
