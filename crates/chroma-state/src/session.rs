//! The editor session: explicitly constructed root of all interactive state.
//!
//! One session owns the config, the fingerprint cache, the undo stack, the
//! subscription registry, and the event bus, and every edit funnels through
//! it so the pieces fire in a fixed order: snapshot capture, config
//! mutation, event publication, cache validation, subscription rebroadcast.
//! Components never reach for globals; tests construct fresh sessions.

use std::cell::Cell;
use std::rc::Rc;

use chroma_config::{Config, Field, ItemKind, ProcessorPair, View};

use crate::cache::FingerprintCache;
use crate::error::Result;
use crate::events::{Event, EventBus, SubscriberId};
use crate::subscription::{MenuItem, Slot, SubscriptionRegistry};
use crate::undo::UndoStack;

/// Root of all interactive-thread editor state.
pub struct EditorSession {
    config: Config,
    cache: FingerprintCache,
    undo: UndoStack,
    registry: SubscriptionRegistry,
    bus: EventBus,
    subscriptions_stale: Rc<Cell<bool>>,
}

impl EditorSession {
    /// Create a session around an initial config.
    ///
    /// The subscription registry's payload caches are tied to the
    /// fingerprint cache's lifetime through a reset callback, so both join
    /// the same invalidation wave without a direct dependency.
    pub fn new(config: Config) -> Self {
        let mut cache = FingerprintCache::new();
        let subscriptions_stale = Rc::new(Cell::new(false));
        {
            let flag = Rc::clone(&subscriptions_stale);
            cache.register_reset_callback(move || flag.set(true));
        }
        Self {
            config,
            cache,
            undo: UndoStack::new(),
            registry: SubscriptionRegistry::new(),
            bus: EventBus::new(),
            subscriptions_stale,
        }
    }

    /// The current config.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The undo stack (labels and depths, for menu display).
    pub fn undo_stack(&self) -> &UndoStack {
        &self.undo
    }

    /// Subscribe to model events.
    pub fn subscribe_events(&mut self, callback: impl FnMut(&Event) + 'static) -> SubscriberId {
        self.bus.subscribe(callback)
    }

    /// Drop an event subscription.
    pub fn unsubscribe_events(&mut self, id: SubscriberId) {
        self.bus.unsubscribe(id);
    }

    // ========================================================================
    // Edits
    // ========================================================================

    /// Create an item, generating a unique default name if none is given.
    pub fn create_item(&mut self, kind: ItemKind, name: Option<&str>) -> Result<String> {
        let name = match name {
            Some(name) => name.to_string(),
            None => self.config.next_name(kind),
        };
        let label = format!("Create {}", kind.label());
        let item_name = name.clone();
        self.undo.scoped(
            &label,
            kind,
            Some(name.clone()),
            &mut self.config,
            &mut self.bus,
            move |config, bus| {
                config.create_item(kind, &item_name)?;
                bus.publish(&Event::ItemAdded {
                    kind,
                    name: item_name.clone(),
                });
                Ok(())
            },
        )?;
        self.after_edit(kind, Some(&name));
        Ok(name)
    }

    /// Remove a named item.
    pub fn remove_item(&mut self, kind: ItemKind, name: &str) -> Result<()> {
        let label = format!("Delete {}", kind.label());
        let item_name = name.to_string();
        self.undo.scoped(
            &label,
            kind,
            None,
            &mut self.config,
            &mut self.bus,
            move |config, bus| {
                config.remove_item(kind, &item_name)?;
                bus.publish(&Event::ItemRemoved {
                    kind,
                    name: item_name.clone(),
                });
                Ok(())
            },
        )?;
        self.after_edit(kind, None);
        Ok(())
    }

    /// Move a named item to a new row within its kind.
    pub fn move_item(&mut self, kind: ItemKind, name: &str, dst_row: usize) -> Result<()> {
        let label = format!("Move {}", kind.label());
        let item_name = name.to_string();
        self.undo.scoped(
            &label,
            kind,
            Some(name.to_string()),
            &mut self.config,
            &mut self.bus,
            move |config, bus| {
                config.move_item(kind, &item_name, dst_row)?;
                bus.publish(&Event::ItemMoved {
                    kind,
                    name: item_name.clone(),
                });
                Ok(())
            },
        )?;
        self.after_edit(kind, Some(name));
        Ok(())
    }

    /// Rename a named item.
    ///
    /// The bound subscription slot (if any) keeps its number; its payload
    /// is re-resolved under the new name and rebroadcast exactly once.
    pub fn rename_item(&mut self, kind: ItemKind, old: &str, new: &str) -> Result<()> {
        if old == new {
            return Ok(());
        }
        let label = format!("Rename {} {old}", kind.label());
        let (old_name, new_name) = (old.to_string(), new.to_string());
        self.undo.scoped(
            &label,
            kind,
            Some(new.to_string()),
            &mut self.config,
            &mut self.bus,
            move |config, bus| {
                config.rename_item(kind, &old_name, &new_name)?;
                bus.publish(&Event::ItemRenamed {
                    kind,
                    old: old_name.clone(),
                    new: new_name.clone(),
                });
                Ok(())
            },
        )?;
        // The rename broadcast below covers the affected slot; consume the
        // invalidation wave so it is not rebroadcast a second time.
        self.cache.validate(&self.config);
        self.subscriptions_stale.set(false);
        self.registry.handle_rename(&self.config, kind, old, new);
        Ok(())
    }

    /// Edit one field of a named item.
    ///
    /// Fields with side effects beyond their own cell (names, process space
    /// references) are captured as scoped snapshots; plain value fields
    /// become leaf field-edit records. Returns whether anything changed.
    pub fn set_field(
        &mut self,
        kind: ItemKind,
        name: &str,
        field: Field,
        value: &str,
    ) -> Result<bool> {
        if matches!(field, Field::Name) {
            let changed = name != value;
            self.rename_item(kind, name, value)?;
            return Ok(changed);
        }
        let old = self.config.field(kind, name, field)?;
        if old == value {
            return Ok(false);
        }
        let label = format!("Edit {name} {}", field.id());

        if Self::field_needs_snapshot(field) {
            let (item_name, new_value) = (name.to_string(), value.to_string());
            self.undo.scoped(
                &label,
                kind,
                Some(name.to_string()),
                &mut self.config,
                &mut self.bus,
                move |config, bus| {
                    config.set_field(kind, &item_name, field, &new_value)?;
                    bus.publish(&Event::CellChanged {
                        kind,
                        name: item_name.clone(),
                        field,
                    });
                    Ok(())
                },
            )?;
        } else {
            self.config.set_field(kind, name, field, value)?;
            self.bus.publish(&Event::CellChanged {
                kind,
                name: name.to_string(),
                field,
            });
            self.undo.push_field_edit(label, kind, name, field, old, value);
        }
        self.after_edit(kind, Some(name));
        Ok(true)
    }

    /// Append a view to a display.
    pub fn add_view(&mut self, display: &str, view: View) -> Result<()> {
        let label = format!("Add view to {display}");
        let display_name = display.to_string();
        self.undo.scoped(
            &label,
            ItemKind::Display,
            Some(display.to_string()),
            &mut self.config,
            &mut self.bus,
            move |config, bus| {
                config.add_view(&display_name, view)?;
                bus.publish(&Event::CellChanged {
                    kind: ItemKind::Display,
                    name: display_name.clone(),
                    field: Field::Transform,
                });
                Ok(())
            },
        )?;
        self.after_edit(ItemKind::Display, Some(display));
        Ok(())
    }

    /// Remove a view from a display.
    pub fn remove_view(&mut self, display: &str, view: &str) -> Result<()> {
        let label = format!("Remove view from {display}");
        let (display_name, view_name) = (display.to_string(), view.to_string());
        self.undo.scoped(
            &label,
            ItemKind::Display,
            Some(display.to_string()),
            &mut self.config,
            &mut self.bus,
            move |config, bus| {
                config.remove_view(&display_name, &view_name)?;
                bus.publish(&Event::CellChanged {
                    kind: ItemKind::Display,
                    name: display_name.clone(),
                    field: Field::Transform,
                });
                Ok(())
            },
        )?;
        self.after_edit(ItemKind::Display, Some(display));
        Ok(())
    }

    // ========================================================================
    // Undo / redo
    // ========================================================================

    /// Undo the most recent edit. Returns whether anything was applied.
    pub fn undo(&mut self) -> bool {
        let applied = self.undo.undo(&mut self.config, &mut self.bus);
        if applied {
            self.refresh_after_state_swap();
        }
        applied
    }

    /// Redo the most recently undone edit. Returns whether anything was
    /// applied.
    pub fn redo(&mut self) -> bool {
        let applied = self.undo.redo(&mut self.config, &mut self.bus);
        if applied {
            self.refresh_after_state_swap();
        }
        applied
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Bind a subscription slot to a named item.
    pub fn bind_slot(&mut self, slot: Slot, kind: ItemKind, name: &str) {
        self.registry.set_subscription(slot, kind, name, &self.config);
    }

    /// Release a subscription slot.
    pub fn clear_slot(&mut self, slot: Slot) {
        self.registry.clear_slot(slot);
    }

    /// The slot bound to `(kind, name)`, if any.
    pub fn slot_of(&self, kind: ItemKind, name: &str) -> Option<Slot> {
        self.registry.slot_of(kind, name)
    }

    /// Subscribe to payload updates at one slot.
    pub fn subscribe_to_slot(
        &mut self,
        slot: Slot,
        callback: impl FnMut(Slot, &ProcessorPair) + 'static,
    ) {
        self.registry.subscribe_to_slot(slot, &self.config, callback);
    }

    /// Subscribe to subscription menu updates.
    pub fn subscribe_to_menu(&mut self, callback: impl FnMut(&[MenuItem]) + 'static) {
        self.registry.subscribe_to_menu(callback);
    }

    /// Subscribe to new-subscription initialization.
    pub fn subscribe_to_init(&mut self, callback: impl FnMut(Slot) + 'static) {
        self.registry.subscribe_to_init(callback);
    }

    // ========================================================================
    // Derived queries
    // ========================================================================

    /// Ordered color space names (cached).
    pub fn color_space_names(&mut self) -> Vec<String> {
        self.cache.color_space_names(&self.config)
    }

    /// Ordered look names (cached).
    pub fn look_names(&mut self) -> Vec<String> {
        self.cache.look_names(&self.config)
    }

    /// Ordered display names (cached).
    pub fn display_names(&mut self) -> Vec<String> {
        self.cache.display_names(&self.config)
    }

    /// Every name in use anywhere (cached).
    pub fn all_names(&mut self) -> Vec<String> {
        self.cache.all_names(&self.config)
    }

    // ========================================================================
    // Internal wiring
    // ========================================================================

    /// Run the post-edit consistency pass: validate the cache (firing the
    /// invalidation wave) and rebroadcast subscription payloads.
    fn after_edit(&mut self, kind: ItemKind, changed_name: Option<&str>) {
        self.cache.validate(&self.config);
        if self.subscriptions_stale.replace(false) {
            self.registry.rebroadcast_all(&self.config);
        } else if let Some(name) = changed_name {
            self.registry.notify_changed(&self.config, kind, name);
        }
    }

    fn refresh_after_state_swap(&mut self) {
        self.cache.validate(&self.config);
        self.subscriptions_stale.set(false);
        self.registry.reconcile(&self.config);
        self.registry.rebroadcast_all(&self.config);
    }

    fn field_needs_snapshot(field: Field) -> bool {
        matches!(field, Field::Name | Field::ProcessSpace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chroma_config::ColorSpace;

    fn session_ab() -> EditorSession {
        let mut config = Config::new();
        config.add_color_space(ColorSpace::new("A")).unwrap();
        config.add_color_space(ColorSpace::new("B")).unwrap();
        EditorSession::new(config)
    }

    #[test]
    fn create_item_generates_unique_default_names() {
        let mut session = session_ab();
        let first = session.create_item(ItemKind::Look, None).unwrap();
        let second = session.create_item(ItemKind::Look, None).unwrap();
        assert_eq!(first, "Look_1");
        assert_eq!(second, "Look_2");
        assert_eq!(session.look_names(), ["Look_1", "Look_2"]);
    }

    #[test]
    fn unchanged_value_is_not_an_edit() {
        let mut session = session_ab();
        let changed = session
            .set_field(ItemKind::ColorSpace, "A", Field::Family, "")
            .unwrap();
        assert!(!changed);
        assert_eq!(session.undo_stack().undo_len(), 0);
    }

    #[test]
    fn cached_queries_follow_edits() {
        let mut session = session_ab();
        assert_eq!(session.color_space_names(), ["A", "B"]);
        session.create_item(ItemKind::ColorSpace, Some("C")).unwrap();
        assert_eq!(session.color_space_names(), ["A", "B", "C"]);
        session.undo();
        assert_eq!(session.color_space_names(), ["A", "B"]);
    }

    #[test]
    fn undo_of_empty_stack_is_a_no_op() {
        let mut session = session_ab();
        assert!(!session.undo());
        assert!(!session.redo());
    }
}
