//! Interrupt handling.
//!
//! Tokio keeps a signal handler installed once it has been registered, so
//! the process never falls back to the default action. Instead a watcher
//! spawned at startup turns every SIGINT/SIGTERM into an `Interrupted`
//! exit, unless a step with its own cleanup has claimed the signal through
//! an [`InterruptScope`].

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::domain::error::InstallError;

/// Counts the steps currently handling interrupts themselves.
pub struct InterruptGate {
    claimed: AtomicUsize,
}

static GATE: InterruptGate = InterruptGate::new();

impl InterruptGate {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            claimed: AtomicUsize::new(0),
        }
    }

    /// `true` while no step has claimed interrupts.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.claimed.load(Ordering::SeqCst) == 0
    }

    /// Claim interrupts until the returned scope is dropped.
    #[must_use]
    pub fn claim(&self) -> InterruptScope<'_> {
        self.claimed.fetch_add(1, Ordering::SeqCst);
        InterruptScope { gate: self }
    }
}

impl Default for InterruptGate {
    fn default() -> Self {
        Self::new()
    }
}

/// While alive, the startup watcher leaves interrupts to the owner.
pub struct InterruptScope<'a> {
    gate: &'a InterruptGate,
}

impl Drop for InterruptScope<'_> {
    fn drop(&mut self) {
        self.gate.claimed.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Claim interrupts on the process-wide gate.
#[must_use]
pub fn claim_interrupts() -> InterruptScope<'static> {
    GATE.claim()
}

/// Spawn the process-wide watcher. On an unclaimed interrupt it reports
/// [`InstallError::Interrupted`] and exits with status 1.
pub fn exit_on_interrupt() {
    tokio::spawn(async {
        loop {
            interrupted().await;
            if GATE.is_open() {
                eprintln!("Error: {}", InstallError::Interrupted);
                std::process::exit(1);
            }
            tracing::debug!("interrupt handled by the running step");
        }
    });
}

/// Resolves on Ctrl-C or SIGTERM. Never resolves if no handler can be
/// installed.
pub async fn interrupted() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut term) = signal(SignalKind::terminate()) {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if result.is_err() {
                        term.recv().await;
                    }
                }
                _ = term.recv() => {}
            }
            tracing::debug!("received interrupt signal");
            return;
        }
    }
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
    tracing::debug!("received interrupt signal");
}
