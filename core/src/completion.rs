//! Counter of outstanding work units.
//!
//! Every dispatcher owns its own [`CompletionCounter`]; nothing here is
//! process-wide, so independent dispatchers never observe each other.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    outstanding: AtomicUsize,
    started: AtomicUsize,
    completed: AtomicUsize,
    zero: Notify,
}

#[derive(Debug, Clone, Default)]
pub struct CompletionCounter(Arc<Inner>);

impl CompletionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one more outstanding unit.
    ///
    /// The returned guard signals completion exactly once when dropped,
    /// whether the unit returned normally, failed, or panicked.
    pub fn increment(&self) -> CompletionGuard {
        self.0.started.fetch_add(1, Ordering::SeqCst);
        self.0.outstanding.fetch_add(1, Ordering::SeqCst);
        CompletionGuard {
            counter: self.clone(),
        }
    }

    pub fn outstanding(&self) -> usize {
        self.0.outstanding.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> usize {
        self.0.started.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.0.completed.load(Ordering::SeqCst)
    }

    /// Suspends until no unit is outstanding. Returns at once if none is.
    pub async fn wait_zero(&self) {
        loop {
            let notified = self.0.zero.notified();
            tokio::pin!(notified);
            // Register before re-checking so a concurrent drop to zero cannot be missed.
            notified.as_mut().enable();

            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }

    fn release(&self) {
        self.0.completed.fetch_add(1, Ordering::SeqCst);
        if self.0.outstanding.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.zero.notify_waiters();
        }
    }
}

/// RAII handle for one outstanding unit.
#[derive(Debug)]
#[must_use = "dropping the guard immediately marks the unit as completed"]
pub struct CompletionGuard {
    counter: CompletionCounter,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.counter.release();
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
