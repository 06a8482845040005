//! Error types for the notification router.

use thiserror::Error;

/// Errors surfaced by the router's public API.
///
/// Conversion failures inside the worker never reach here; they are logged
/// and only skip the affected destination for that one message.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RouterError {
    /// The worker did not stop within the shutdown grace period.
    ///
    /// The worker fully drains one message between dequeues, so missing
    /// the grace window means it is stuck. Callers must treat this as
    /// fatal and exit non-zero.
    #[error("worker did not stop within {waited_ms} ms")]
    ShutdownTimeout {
        /// How long shutdown waited before giving up.
        waited_ms: u64,
    },

    /// The worker thread ended before shutdown was requested.
    #[error("worker thread is no longer running")]
    WorkerGone,
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, RouterError>;
