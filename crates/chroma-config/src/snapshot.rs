//! Full-state snapshot save/restore.
//!
//! The undo engine depends only on this narrow capability, never on config
//! internals, so it can be tested against an in-memory fake store. Blobs
//! are opaque bytes to every consumer; the current encoding is serde_json
//! but nothing outside this module may rely on that.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{ConfigError, Result};

/// Opaque serialized config state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotBlob(Vec<u8>);

impl SnapshotBlob {
    /// Raw bytes (for queueing to the notification router).
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Wrap raw bytes received from a queue.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Full-state serialize/restore capability.
pub trait Snapshot: Sized {
    /// Serialize the complete current state.
    fn save(&self) -> Result<SnapshotBlob>;

    /// Reconstruct an equivalent object from a blob.
    fn restore(blob: &SnapshotBlob) -> Result<Self>;
}

impl Snapshot for Config {
    fn save(&self) -> Result<SnapshotBlob> {
        let bytes = serde_json::to_vec(self).map_err(|e| ConfigError::SnapshotEncode {
            reason: e.to_string(),
        })?;
        Ok(SnapshotBlob(bytes))
    }

    fn restore(blob: &SnapshotBlob) -> Result<Self> {
        serde_json::from_slice(&blob.0).map_err(|e| ConfigError::SnapshotDecode {
            reason: e.to_string(),
        })
    }
}
