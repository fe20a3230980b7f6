//! Progress reporting and cancellation for the index build.
//!
//! Index building is the one long-running operation in the crate and is expected to
//! run off the interactive thread. Callers observe it through a [`Progress`] sink
//! and may abort it through a [`CancelToken`]. Both follow the null-object pattern:
//! the default sink discards reports and the default token never fires, so the
//! builder never special-cases an absent collaborator.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Sink for index build progress events.
///
/// Reports are percentages of bytes processed, monotonically non-decreasing from 0
/// to 100. Implementations must be cheap and non-blocking - reports are issued from
/// the build thread and, during the parallel pass, from worker threads.
pub trait Progress: Send + Sync {
    /// Called with the current completion percentage (0..=100).
    fn report(&self, percent: u32) {
        let _ = percent;
    }
}

/// A progress sink that discards all reports.
///
/// Installed by default so the builder never has to check for an absent sink.
#[derive(Debug, Default)]
pub struct NullProgress;

impl Progress for NullProgress {}

/// Cooperative cancellation flag for an in-progress index build.
///
/// Cloning shares the underlying flag: the caller keeps one clone and hands the
/// other to the load. Once cancelled the flag never resets; a fresh build needs a
/// fresh token. Cancellation discards all partially built state and releases the
/// file handle - no partial index is ever observable.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a new, unfired token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the build holding this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
