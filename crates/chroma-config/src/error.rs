//! Error types for the config model.

use thiserror::Error;

use crate::config::ItemKind;

/// Convenience alias for config-layer results.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised by the config model.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// The config is in a transiently inconsistent state (mid-edit).
    ///
    /// Fingerprinting and undo capture treat this as recoverable; callers
    /// must never surface it to the interactive thread as a hard failure.
    #[error("config is in an invalid state: {reason}")]
    InvalidState {
        /// First validation problem found.
        reason: String,
    },

    /// No item of the given kind with the given name.
    #[error("no {kind} named {name:?}")]
    NotFound {
        /// Item kind that was searched.
        kind: ItemKind,
        /// Name that did not resolve.
        name: String,
    },

    /// The requested name is already used by an item, alias, or role.
    #[error("name {name:?} is already in use")]
    NameInUse {
        /// The conflicting name.
        name: String,
    },

    /// A field is not defined for the item kind it was requested on.
    #[error("{kind} has no field {field:?}")]
    NoSuchField {
        /// Item kind the access targeted.
        kind: ItemKind,
        /// Field name as requested.
        field: String,
    },

    /// A snapshot blob could not be decoded back into a config.
    #[error("snapshot restore failed: {reason}")]
    SnapshotDecode {
        /// Decoder error text.
        reason: String,
    },

    /// A snapshot blob could not be produced.
    #[error("snapshot save failed: {reason}")]
    SnapshotEncode {
        /// Encoder error text.
        reason: String,
    },

    /// A transform chain references a name that does not resolve.
    #[error("cannot resolve processor for {kind} {name:?}: {reason}")]
    Unresolvable {
        /// Item kind being resolved.
        kind: ItemKind,
        /// Item name being resolved.
        name: String,
        /// Why resolution failed.
        reason: String,
    },
}

impl ConfigError {
    /// Create an invalid-state error.
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState {
            reason: reason.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(kind: ItemKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }
}
