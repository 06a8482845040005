//! Content fingerprinting for the config.
//!
//! A fingerprint is a SHA-256 digest of the canonical serialized config.
//! Equal fingerprints imply semantically equal content, which is what lets
//! the derived-query cache and the undo engine compare states cheaply.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::Config;
use crate::error::{ConfigError, Result};

/// Opaque comparable token for the content of a whole config.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// A fresh random fingerprint that matches nothing.
    ///
    /// Used when fingerprinting fails on a transiently invalid config: the
    /// disposable id forces the cache to invalidate again on the next valid
    /// read, so invalid states are never memoized.
    pub fn disposable() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Hex digest string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Config {
    /// Compute the content fingerprint of this config.
    ///
    /// Fails with [`ConfigError::InvalidState`] while the config is in a
    /// transiently inconsistent state; callers on the degraded path
    /// substitute [`Fingerprint::disposable`].
    pub fn fingerprint(&self) -> Result<Fingerprint> {
        self.validate()?;
        let canonical = serde_json::to_vec(self).map_err(|e| ConfigError::SnapshotEncode {
            reason: e.to_string(),
        })?;
        let digest = Sha256::digest(&canonical);
        Ok(Fingerprint(hex::encode(digest)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColorSpace, ItemKind};

    #[test]
    fn equal_content_equal_fingerprint() {
        let mut a = Config::new();
        a.add_color_space(ColorSpace::new("X")).unwrap();
        let b = a.clone();
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }

    #[test]
    fn any_edit_changes_fingerprint() {
        let mut config = Config::new();
        config.add_color_space(ColorSpace::new("X")).unwrap();
        let before = config.fingerprint().unwrap();
        config
            .set_field(ItemKind::ColorSpace, "X", crate::Field::Family, "aces")
            .unwrap();
        assert_ne!(before, config.fingerprint().unwrap());
    }

    #[test]
    fn invalid_config_refuses_to_fingerprint() {
        let mut config = Config::new();
        config.add_color_space(ColorSpace::new("X")).unwrap();
        let mut bad = config.clone();
        bad.add_color_space(ColorSpace::new("Y")).unwrap();
        assert!(bad.fingerprint().is_ok());
        let mut look = crate::Look::new("L");
        look.process_space = "missing".to_string();
        assert!(bad.add_look(look).is_ok());
        assert!(matches!(
            bad.fingerprint(),
            Err(ConfigError::InvalidState { .. })
        ));
    }

    #[test]
    fn disposable_fingerprints_never_collide_with_real_ones() {
        let config = Config::new();
        let real = config.fingerprint().unwrap();
        let disposable = Fingerprint::disposable();
        assert_ne!(real, disposable);
        assert_ne!(Fingerprint::disposable(), Fingerprint::disposable());
    }
}
