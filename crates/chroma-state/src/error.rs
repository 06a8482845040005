//! Error types for the state layer.

use thiserror::Error;

/// Convenience alias for state-layer results.
pub type Result<T> = std::result::Result<T, StateError>;

/// Errors raised by the interactive-thread state layer.
///
/// Most data-layer failures degrade gracefully (warning event plus a no-op)
/// instead of surfacing here; this type covers the cases a caller can
/// actually act on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StateError {
    /// The config collaborator rejected an operation.
    #[error(transparent)]
    Config(#[from] chroma_config::ConfigError),

    /// A subscription slot index outside the valid range.
    #[error("subscription slot {slot} out of range (0..{max})")]
    SlotOutOfRange {
        /// Requested slot index.
        slot: usize,
        /// Number of available slots.
        max: usize,
    },
}
