//! Derived-query cache keyed by the config content fingerprint.
//!
//! Query results stay valid exactly as long as the config fingerprint is
//! unchanged. `validate` detects a fingerprint change, clears every entry,
//! and runs the registered reset callbacks so external caches tied to this
//! one's lifetime (per-item subscription payloads, model row caches) join
//! the same invalidation wave without a direct dependency.

use std::collections::HashMap;

use chroma_config::{Config, Fingerprint, ItemKind};

/// A derived read-query over the config.
///
/// The variants carry the query parameters; together with the variant tag
/// they form the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Query {
    /// Ordered color space names.
    ColorSpaceNames,
    /// Ordered look names.
    LookNames,
    /// Ordered display names.
    DisplayNames,
    /// View names of one display.
    ViewNames {
        /// Display to list views for.
        display: String,
    },
    /// Every name in use anywhere (items, aliases, roles).
    AllNames,
    /// Sorted distinct color space families.
    Families,
    /// Sorted distinct color space encodings.
    Encodings,
    /// Sorted distinct categories.
    Categories,
    /// Sorted role names.
    RoleNames,
}

/// Fingerprint-validated memo of derived name lists.
#[derive(Default)]
pub struct FingerprintCache {
    cache_id: Option<Fingerprint>,
    entries: HashMap<Query, Vec<String>>,
    reset_callbacks: Vec<Box<dyn FnMut()>>,
}

impl FingerprintCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cache id for the current config state.
    ///
    /// If the config is transiently invalid this substitutes a fresh
    /// disposable fingerprint, which is guaranteed to also mismatch on the
    /// next validation, so invalid states are never memoized.
    pub fn current_cache_id(config: &Config) -> (Fingerprint, bool) {
        match config.fingerprint() {
            Ok(fp) => (fp, true),
            Err(error) => {
                tracing::warn!(%error, "fingerprint failed; substituting disposable cache id");
                (Fingerprint::disposable(), false)
            }
        }
    }

    /// Register a callback run whenever the cache is cleared. Append-only;
    /// callbacks fire in registration order.
    pub fn register_reset_callback(&mut self, callback: impl FnMut() + 'static) {
        self.reset_callbacks.push(Box::new(callback));
    }

    /// Check cache validity, clearing everything if the config changed.
    ///
    /// Returns whether the cache was still valid. On `false` every entry is
    /// gone and all reset callbacks have run.
    pub fn validate(&mut self, config: &Config) -> bool {
        let (cache_id, _valid) = Self::current_cache_id(config);
        if self.cache_id.as_ref() != Some(&cache_id) {
            tracing::debug!(new_id = %cache_id, "config fingerprint changed; resetting caches");
            self.entries.clear();
            for callback in &mut self.reset_callbacks {
                callback();
            }
            self.cache_id = Some(cache_id);
            return false;
        }
        true
    }

    /// Return the cached value for `query`, computing and storing it if the
    /// cache was invalidated or the query has not been seen at this
    /// fingerprint.
    pub fn get_or_compute(
        &mut self,
        config: &Config,
        query: Query,
        compute: impl FnOnce(&Config) -> Vec<String>,
    ) -> Vec<String> {
        if !self.validate(config) || !self.entries.contains_key(&query) {
            let value = compute(config);
            self.entries.insert(query.clone(), value);
        }
        self.entries[&query].clone()
    }

    // ========================================================================
    // Typed query helpers
    // ========================================================================

    /// Ordered color space names.
    pub fn color_space_names(&mut self, config: &Config) -> Vec<String> {
        self.get_or_compute(config, Query::ColorSpaceNames, |c| {
            c.item_names(ItemKind::ColorSpace)
        })
    }

    /// Ordered look names.
    pub fn look_names(&mut self, config: &Config) -> Vec<String> {
        self.get_or_compute(config, Query::LookNames, |c| c.item_names(ItemKind::Look))
    }

    /// Ordered display names.
    pub fn display_names(&mut self, config: &Config) -> Vec<String> {
        self.get_or_compute(config, Query::DisplayNames, |c| {
            c.item_names(ItemKind::Display)
        })
    }

    /// View names of one display (empty if the display is unknown).
    pub fn view_names(&mut self, config: &Config, display: &str) -> Vec<String> {
        let query = Query::ViewNames {
            display: display.to_string(),
        };
        let display = display.to_string();
        self.get_or_compute(config, query, move |c| {
            c.display(&display)
                .map(|d| d.views.iter().map(|v| v.name.clone()).collect())
                .unwrap_or_default()
        })
    }

    /// Every name in use anywhere in the config.
    pub fn all_names(&mut self, config: &Config) -> Vec<String> {
        self.get_or_compute(config, Query::AllNames, Config::all_names)
    }

    /// Sorted distinct color space families.
    pub fn families(&mut self, config: &Config) -> Vec<String> {
        self.get_or_compute(config, Query::Families, |c| {
            let mut families: Vec<String> = c
                .color_spaces()
                .iter()
                .map(|cs| cs.family.clone())
                .filter(|f| !f.is_empty())
                .collect();
            families.sort();
            families.dedup();
            families
        })
    }

    /// Sorted distinct color space encodings.
    pub fn encodings(&mut self, config: &Config) -> Vec<String> {
        self.get_or_compute(config, Query::Encodings, |c| {
            let mut encodings: Vec<String> = c
                .color_spaces()
                .iter()
                .map(|cs| cs.encoding.clone())
                .filter(|e| !e.is_empty())
                .collect();
            encodings.sort();
            encodings.dedup();
            encodings
        })
    }

    /// Sorted distinct categories.
    pub fn categories(&mut self, config: &Config) -> Vec<String> {
        self.get_or_compute(config, Query::Categories, |c| {
            let mut categories: Vec<String> = c
                .color_spaces()
                .iter()
                .flat_map(|cs| cs.categories.iter().cloned())
                .filter(|c| !c.is_empty())
                .collect();
            categories.sort();
            categories.dedup();
            categories
        })
    }

    /// Sorted role names.
    pub fn role_names(&mut self, config: &Config) -> Vec<String> {
        self.get_or_compute(config, Query::RoleNames, |c| {
            c.roles().keys().cloned().collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chroma_config::{ColorSpace, Field};
    use std::cell::Cell;
    use std::rc::Rc;

    fn config_ab() -> Config {
        let mut config = Config::new();
        config.add_color_space(ColorSpace::new("A")).unwrap();
        config.add_color_space(ColorSpace::new("B")).unwrap();
        config
    }

    #[test]
    fn second_read_skips_recompute() {
        let config = config_ab();
        let mut cache = FingerprintCache::new();
        let computes = Rc::new(Cell::new(0));

        for _ in 0..3 {
            let computes = Rc::clone(&computes);
            let names = cache.get_or_compute(&config, Query::ColorSpaceNames, move |c| {
                computes.set(computes.get() + 1);
                c.item_names(ItemKind::ColorSpace)
            });
            assert_eq!(names, ["A", "B"]);
        }
        assert_eq!(computes.get(), 1);
    }

    #[test]
    fn edit_invalidates_and_recomputes() {
        let mut config = config_ab();
        let mut cache = FingerprintCache::new();
        assert_eq!(cache.color_space_names(&config), ["A", "B"]);

        config.add_color_space(ColorSpace::new("C")).unwrap();
        assert!(!cache.validate(&config));
        assert_eq!(cache.color_space_names(&config), ["A", "B", "C"]);
    }

    #[test]
    fn reset_callbacks_run_in_registration_order() {
        let mut config = config_ab();
        let mut cache = FingerprintCache::new();
        let order = Rc::new(std::cell::RefCell::new(Vec::new()));
        for tag in ["one", "two"] {
            let order = Rc::clone(&order);
            cache.register_reset_callback(move || order.borrow_mut().push(tag));
        }

        cache.validate(&config); // first validation always resets
        config.add_color_space(ColorSpace::new("C")).unwrap();
        cache.validate(&config);
        assert_eq!(*order.borrow(), ["one", "two", "one", "two"]);
    }

    #[test]
    fn invalid_state_is_never_memoized() {
        let mut config = config_ab();
        let mut cache = FingerprintCache::new();
        cache.validate(&config);

        // Make the config transiently invalid
        let mut look = chroma_config::Look::new("L");
        look.process_space = "missing".to_string();
        config.add_look(look).unwrap();
        assert!(!cache.validate(&config));
        // Still invalid: the disposable id mismatches itself next time
        assert!(!cache.validate(&config));

        // Repair and confirm one more reset, then stability
        config
            .set_field(ItemKind::Look, "L", Field::ProcessSpace, "A")
            .unwrap();
        assert!(!cache.validate(&config));
        assert!(cache.validate(&config));
    }
}
