//! Progress indicators using indicatif

#![allow(clippy::expect_used)] // Templates are compile-time constants

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

/// Create a spinner for indeterminate progress.
///
/// # Panics
///
/// Panics if the spinner template string is invalid (it is a compile-time constant and will not panic).
#[must_use]
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"])
            .template("  {spinner:.cyan} {msg} {elapsed:.dim}")
            .expect("valid template"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Clear a spinner so the reporter's own result line replaces it.
pub fn finish_clear(pb: &ProgressBar) {
    pb.finish_and_clear();
}

/// Await `work` behind a spinner when `show` is set.
///
/// # Errors
///
/// Returns whatever `work` returns.
pub async fn with_spinner<T>(
    show: bool,
    msg: &str,
    work: impl Future<Output = Result<T>>,
) -> Result<T> {
    if !show {
        return work.await;
    }
    let pb = spinner(msg);
    let result = work.await;
    finish_clear(&pb);
    result
}
