//! Snapshot-based undo/redo for opaque config mutations.
//!
//! The config exposes no diff or event log, so reversibility comes from two
//! shapes of record: a field edit (one value through one setter path) and a
//! full before/after snapshot pair wrapped around any composite edit. The
//! stack is strictly linear; a new edit discards the redo tail.

use chroma_config::{Config, Field, Fingerprint, ItemKind, Snapshot, SnapshotBlob};

use crate::events::{Event, EventBus};

/// A config state captured for undo: fingerprint plus snapshot blob.
#[derive(Debug, Clone)]
pub struct StateCapture {
    /// Fingerprint at capture time.
    pub fingerprint: Fingerprint,
    /// Full-state blob sufficient to rebuild the config.
    pub blob: SnapshotBlob,
}

impl StateCapture {
    /// Capture the current config state, or `None` if the config is in a
    /// transiently invalid state (fingerprint or snapshot failed).
    pub fn take(config: &Config) -> Option<Self> {
        let fingerprint = config.fingerprint().ok()?;
        let blob = config.save().ok()?;
        Some(Self { fingerprint, blob })
    }
}

/// One reversible edit.
#[derive(Debug, Clone)]
pub enum UndoRecord {
    /// A single field edit, undone by re-applying the old value through the
    /// same setter path (which re-triggers normal change notification).
    FieldEdit {
        /// Human-readable action label.
        label: String,
        /// Item kind.
        kind: ItemKind,
        /// Item name (the stable reference for this row).
        name: String,
        /// Edited field.
        field: Field,
        /// Value before the edit.
        old: String,
        /// Value after the edit.
        new: String,
    },
    /// A composite edit captured as full before/after snapshots.
    Snapshot {
        /// Human-readable action label.
        label: String,
        /// State before the edit.
        before: StateCapture,
        /// State after the edit.
        after: StateCapture,
        /// Kind of the item the edit targeted (drives reselection).
        kind: ItemKind,
        /// Item name to reselect after applying, when still present.
        focus: Option<String>,
    },
}

impl UndoRecord {
    /// The record's action label.
    pub fn label(&self) -> &str {
        match self {
            Self::FieldEdit { label, .. } | Self::Snapshot { label, .. } => label,
        }
    }
}

enum Apply {
    Undo,
    Redo,
}

/// Linear undo/redo stack.
#[derive(Default)]
pub struct UndoStack {
    undo: Vec<UndoRecord>,
    redo: Vec<UndoRecord>,
    scope_depth: usize,
}

impl UndoStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of undoable records.
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Number of redoable records.
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Label of the next undo action, if any.
    pub fn undo_label(&self) -> Option<&str> {
        self.undo.last().map(UndoRecord::label)
    }

    /// Label of the next redo action, if any.
    pub fn redo_label(&self) -> Option<&str> {
        self.redo.last().map(UndoRecord::label)
    }

    /// Whether a scoped capture is currently active.
    pub fn in_scope(&self) -> bool {
        self.scope_depth > 0
    }

    /// Push a record, discarding the redo tail.
    pub fn push(&mut self, record: UndoRecord) {
        self.redo.clear();
        self.undo.push(record);
    }

    /// Record an already-applied field edit.
    ///
    /// Ignored while a scoped capture is active: the outer snapshot pair
    /// already spans the edit.
    pub fn push_field_edit(
        &mut self,
        label: impl Into<String>,
        kind: ItemKind,
        name: impl Into<String>,
        field: Field,
        old: impl Into<String>,
        new: impl Into<String>,
    ) {
        if self.in_scope() {
            return;
        }
        self.push(UndoRecord::FieldEdit {
            label: label.into(),
            kind,
            name: name.into(),
            field,
            old: old.into(),
            new: new.into(),
        });
    }

    /// Run a composite edit inside a scoped snapshot capture.
    ///
    /// Captures {fingerprint, blob} before and after `f`. The record is
    /// pushed only if both captures succeeded and the edit actually changed
    /// the fingerprint; otherwise the edit stands but is not undoable, and
    /// a warning is published. Scopes nest by coalescing: an inner scope
    /// opened while an outer capture is active contributes nothing, so one
    /// user gesture is always one undo step.
    pub fn scoped<T>(
        &mut self,
        label: &str,
        kind: ItemKind,
        focus: Option<String>,
        config: &mut Config,
        bus: &mut EventBus,
        f: impl FnOnce(&mut Config, &mut EventBus) -> crate::Result<T>,
    ) -> crate::Result<T> {
        if self.in_scope() {
            self.scope_depth += 1;
            let result = f(config, bus);
            self.scope_depth -= 1;
            return result;
        }

        let before = StateCapture::take(config);
        self.scope_depth += 1;
        let result = f(config, bus);
        self.scope_depth -= 1;

        if result.is_ok() {
            let after = StateCapture::take(config);
            match (before, after) {
                (Some(before), Some(after)) => {
                    if before.fingerprint != after.fingerprint {
                        self.push(UndoRecord::Snapshot {
                            label: label.to_string(),
                            before,
                            after,
                            kind,
                            focus,
                        });
                    }
                }
                _ => {
                    tracing::warn!(label, "snapshot capture failed; edit will not be undoable");
                    bus.publish(&Event::Warning {
                        message: format!("\"{label}\" cannot be undone"),
                    });
                }
            }
        }
        result
    }

    /// Undo the most recent record. Returns whether anything was applied.
    ///
    /// A failed undo is a no-op: the record stays on the stack and the
    /// config is left unchanged.
    pub fn undo(&mut self, config: &mut Config, bus: &mut EventBus) -> bool {
        let Some(record) = self.undo.pop() else {
            return false;
        };
        match Self::apply(&record, config, bus, &Apply::Undo) {
            Ok(()) => {
                self.redo.push(record);
                true
            }
            Err(error) => {
                tracing::warn!(%error, label = record.label(), "undo failed; state unchanged");
                self.undo.push(record);
                false
            }
        }
    }

    /// Redo the most recently undone record. Returns whether anything was
    /// applied.
    pub fn redo(&mut self, config: &mut Config, bus: &mut EventBus) -> bool {
        let Some(record) = self.redo.pop() else {
            return false;
        };
        match Self::apply(&record, config, bus, &Apply::Redo) {
            Ok(()) => {
                self.undo.push(record);
                true
            }
            Err(error) => {
                tracing::warn!(%error, label = record.label(), "redo failed; state unchanged");
                self.redo.push(record);
                false
            }
        }
    }

    fn apply(
        record: &UndoRecord,
        config: &mut Config,
        bus: &mut EventBus,
        direction: &Apply,
    ) -> chroma_config::Result<()> {
        match record {
            UndoRecord::FieldEdit {
                kind,
                name,
                field,
                old,
                new,
                ..
            } => {
                let value = match direction {
                    Apply::Undo => old,
                    Apply::Redo => new,
                };
                config.set_field(*kind, name, *field, value)?;
                bus.publish(&Event::CellChanged {
                    kind: *kind,
                    name: name.clone(),
                    field: *field,
                });
                Ok(())
            }
            UndoRecord::Snapshot {
                before,
                after,
                kind,
                focus,
                ..
            } => {
                let target = match direction {
                    Apply::Undo => before,
                    Apply::Redo => after,
                };
                Self::apply_state(config, bus, target, *kind, focus.as_deref())
            }
        }
    }

    /// Swap the config to a captured state and reselect an item.
    ///
    /// Restore failure happens before any observable change, so a failed
    /// apply leaves state untouched. Reselection priority: the exact focus
    /// hint, else the first newly-added name, else the first name whose
    /// row changed, else the first row.
    fn apply_state(
        config: &mut Config,
        bus: &mut EventBus,
        target: &StateCapture,
        kind: ItemKind,
        focus: Option<&str>,
    ) -> chroma_config::Result<()> {
        if config
            .fingerprint()
            .is_ok_and(|current| current == target.fingerprint)
        {
            return Ok(());
        }
        let restored = Config::restore(&target.blob)?;
        let names_before = config.item_names(kind);

        bus.publish(&Event::ResetBegan);
        *config = restored;
        bus.publish(&Event::ResetEnded);

        let names_after = config.item_names(kind);
        if let Some(name) = Self::reselect(focus, &names_before, &names_after) {
            bus.publish(&Event::SelectionRequested { kind, name });
        }
        Ok(())
    }

    fn reselect(focus: Option<&str>, before: &[String], after: &[String]) -> Option<String> {
        if let Some(focus) = focus
            && after.iter().any(|n| n == focus)
        {
            return Some(focus.to_string());
        }
        if let Some(added) = after.iter().find(|n| !before.contains(n)) {
            return Some(added.clone());
        }
        if let Some((_, moved)) = after
            .iter()
            .enumerate()
            .find(|(i, n)| before.get(*i) != Some(*n))
        {
            return Some(moved.clone());
        }
        after.first().cloned()
    }
}
