//! Ten-slot subscription registry for live item processors.
//!
//! A UI widget claims a slot for one named config item and receives that
//! item's resolved [`ProcessorPair`] whenever it changes or is renamed.
//! Bindings are globally unique per `(kind, name)` pair; binding the same
//! item elsewhere silently evicts the older slot. Slot numbers are stable
//! across renames.

use std::collections::BTreeMap;

use chroma_config::{Config, ItemKind, ProcessorPair};

use crate::error::{Result, StateError};

/// Number of subscription slots.
pub const SLOT_COUNT: usize = 10;

/// A subscription slot handle in `[0, SLOT_COUNT)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot(u8);

impl Slot {
    /// Wrap a slot index, rejecting out-of-range values.
    pub fn new(index: usize) -> Result<Self> {
        if index < SLOT_COUNT {
            Ok(Self(index as u8))
        } else {
            Err(StateError::SlotOutOfRange {
                slot: index,
                max: SLOT_COUNT,
            })
        }
    }

    /// Slot index.
    pub fn index(&self) -> usize {
        usize::from(self.0)
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Standard per-slot color (HSV), for consistent badges across UI surfaces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotBadge {
    /// Hue in `[0, 1)`; slot n gets n/10.
    pub hue: f32,
    /// Saturation.
    pub saturation: f32,
    /// Value.
    pub value: f32,
}

impl SlotBadge {
    /// Badge for a slot at default saturation/value.
    pub fn for_slot(slot: Slot) -> Self {
        Self {
            hue: slot.index() as f32 / SLOT_COUNT as f32,
            saturation: 0.5,
            value: 1.0,
        }
    }
}

/// One entry of the subscription menu broadcast to menu observers.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    /// Slot number.
    pub slot: Slot,
    /// Bound item name.
    pub label: String,
    /// Slot badge.
    pub badge: SlotBadge,
}

type PayloadCallback = Box<dyn FnMut(Slot, &ProcessorPair)>;
type MenuCallback = Box<dyn FnMut(&[MenuItem])>;
type InitCallback = Box<dyn FnMut(Slot)>;

/// Registry mapping slots to `(kind, name)` bindings and fanning payload,
/// menu, and init notifications out to observers.
#[derive(Default)]
pub struct SubscriptionRegistry {
    subscriptions: BTreeMap<Slot, (ItemKind, String)>,
    // Names each slot was previously bound to under the same kind, oldest
    // first. Lets `reconcile` follow a binding through undo/redo of renames.
    former_names: BTreeMap<Slot, Vec<String>>,
    payload_subscribers: Vec<(Slot, PayloadCallback)>,
    menu_subscribers: Vec<MenuCallback>,
    init_subscribers: Vec<InitCallback>,
}

impl SubscriptionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a slot to a named item.
    ///
    /// Evicts the slot's previous occupant and any other slot bound to the
    /// same `(kind, name)` pair, then rebroadcasts the menu, fires init
    /// observers if the slot was previously vacant, and performs one
    /// immediate payload broadcast so new subscribers are not left stale.
    pub fn set_subscription(
        &mut self,
        slot: Slot,
        kind: ItemKind,
        name: impl Into<String>,
        config: &Config,
    ) {
        let name = name.into();
        let was_vacant = !self.subscriptions.contains_key(&slot);

        self.subscriptions.remove(&slot);
        self.former_names.remove(&slot);
        let evicted: Vec<Slot> = self
            .subscriptions
            .iter()
            .filter(|(_, (k, n))| *k == kind && *n == name)
            .map(|(s, _)| *s)
            .collect();
        for other in evicted {
            self.subscriptions.remove(&other);
            self.former_names.remove(&other);
        }

        self.subscriptions.insert(slot, (kind, name.clone()));
        self.broadcast_menu();

        if was_vacant {
            for callback in &mut self.init_subscribers {
                callback(slot);
            }
        }

        self.broadcast_payload(slot, config);
    }

    /// Release a slot, if bound. Rebroadcasts the menu.
    pub fn clear_slot(&mut self, slot: Slot) {
        self.former_names.remove(&slot);
        if self.subscriptions.remove(&slot).is_some() {
            self.broadcast_menu();
        }
    }

    /// Drop every subscription and broadcast an empty menu.
    pub fn reset(&mut self) {
        self.subscriptions.clear();
        self.former_names.clear();
        self.broadcast_menu();
    }

    /// The slot bound to `(kind, name)`, if any.
    pub fn slot_of(&self, kind: ItemKind, name: &str) -> Option<Slot> {
        self.subscriptions
            .iter()
            .find(|(_, (k, n))| *k == kind && n == name)
            .map(|(slot, _)| *slot)
    }

    /// The binding occupying a slot, if any.
    pub fn binding(&self, slot: Slot) -> Option<(ItemKind, &str)> {
        self.subscriptions
            .get(&slot)
            .map(|(kind, name)| (*kind, name.as_str()))
    }

    /// Ordered `(slot, label, badge)` list for subscription menus.
    pub fn menu_items(&self) -> Vec<MenuItem> {
        self.subscriptions
            .iter()
            .map(|(slot, (_, name))| MenuItem {
                slot: *slot,
                label: name.clone(),
                badge: SlotBadge::for_slot(*slot),
            })
            .collect()
    }

    /// Subscribe to payload updates at one slot, with one immediate update
    /// if the slot is currently bound.
    pub fn subscribe_to_slot(
        &mut self,
        slot: Slot,
        config: &Config,
        callback: impl FnMut(Slot, &ProcessorPair) + 'static,
    ) {
        self.payload_subscribers.push((slot, Box::new(callback)));
        if self.subscriptions.contains_key(&slot) {
            self.broadcast_payload(slot, config);
        }
    }

    /// Subscribe to menu updates, with one immediate update.
    pub fn subscribe_to_menu(&mut self, mut callback: impl FnMut(&[MenuItem]) + 'static) {
        callback(&self.menu_items());
        self.menu_subscribers.push(Box::new(callback));
    }

    /// Subscribe to new-subscription initialization, learning about one
    /// existing subscription immediately if any exists.
    pub fn subscribe_to_init(&mut self, mut callback: impl FnMut(Slot) + 'static) {
        if let Some(slot) = self.subscriptions.keys().next() {
            callback(*slot);
        }
        self.init_subscribers.push(Box::new(callback));
    }

    /// Handle an item rename: the slot keeps its number, the stored name is
    /// rewritten, and the payload is re-resolved under the new name and
    /// rebroadcast once, followed by a menu update.
    pub fn handle_rename(&mut self, config: &Config, kind: ItemKind, old: &str, new: &str) {
        let Some(slot) = self.slot_of(kind, old) else {
            return;
        };
        self.former_names
            .entry(slot)
            .or_default()
            .push(old.to_string());
        self.subscriptions.insert(slot, (kind, new.to_string()));
        self.broadcast_payload(slot, config);
        self.broadcast_menu();
    }

    /// Re-key bindings after a config swap (undo/redo).
    ///
    /// A slot whose bound name no longer exists falls back to the most
    /// recent former name that does, so a binding survives undoing and
    /// redoing a rename with its slot number unchanged. The displaced name
    /// joins the history, keeping the round trip symmetric.
    pub fn reconcile(&mut self, config: &Config) {
        let mut changed = false;
        let slots: Vec<Slot> = self.subscriptions.keys().copied().collect();
        for slot in slots {
            let Some((kind, name)) = self.subscriptions.get(&slot).cloned() else {
                continue;
            };
            if config.position_of(kind, &name).is_some() {
                continue;
            }
            let history = self.former_names.entry(slot).or_default();
            if let Some(pos) = history
                .iter()
                .rposition(|former| config.position_of(kind, former).is_some())
            {
                let former = history.remove(pos);
                history.push(name);
                self.subscriptions.insert(slot, (kind, former));
                changed = true;
            }
        }
        if changed {
            self.broadcast_menu();
        }
    }

    /// Rebroadcast the payload of the slot bound to `(kind, name)`, if any.
    pub fn notify_changed(&mut self, config: &Config, kind: ItemKind, name: &str) {
        if let Some(slot) = self.slot_of(kind, name) {
            self.broadcast_payload(slot, config);
        }
    }

    /// Rebroadcast every bound slot's payload (after an invalidation wave).
    pub fn rebroadcast_all(&mut self, config: &Config) {
        let slots: Vec<Slot> = self.subscriptions.keys().copied().collect();
        for slot in slots {
            self.broadcast_payload(slot, config);
        }
    }

    fn broadcast_menu(&mut self) {
        let items = self.menu_items();
        for callback in &mut self.menu_subscribers {
            callback(&items);
        }
    }

    fn broadcast_payload(&mut self, slot: Slot, config: &Config) {
        let Some((kind, name)) = self.subscriptions.get(&slot).cloned() else {
            return;
        };
        // An unresolvable item clears subscribers rather than leaving them
        // showing a stale processor.
        let payload = match config.resolve_processor(kind, &name) {
            Ok(pair) => pair,
            Err(error) => {
                tracing::warn!(%error, slot = %slot, "processor resolution failed");
                ProcessorPair::default()
            }
        };
        for (subscribed_slot, callback) in &mut self.payload_subscribers {
            if *subscribed_slot == slot {
                callback(slot, &payload);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chroma_config::ColorSpace;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn config_with_space(name: &str) -> Config {
        let mut config = Config::new();
        let mut cs = ColorSpace::new(name);
        cs.to_reference = format!("to_ref_{name}");
        config.add_color_space(cs).unwrap();
        config
    }

    #[test]
    fn binding_is_globally_unique() {
        let config = config_with_space("X");
        let mut registry = SubscriptionRegistry::new();
        let slot_a = Slot::new(0).unwrap();
        let slot_b = Slot::new(1).unwrap();

        registry.set_subscription(slot_a, ItemKind::ColorSpace, "X", &config);
        registry.set_subscription(slot_b, ItemKind::ColorSpace, "X", &config);

        assert_eq!(registry.slot_of(ItemKind::ColorSpace, "X"), Some(slot_b));
        assert!(registry.binding(slot_a).is_none());
    }

    #[test]
    fn new_subscriber_gets_immediate_payload() {
        let config = config_with_space("X");
        let mut registry = SubscriptionRegistry::new();
        let slot = Slot::new(2).unwrap();
        registry.set_subscription(slot, ItemKind::ColorSpace, "X", &config);

        let seen = Rc::new(RefCell::new(Vec::new()));
        {
            let seen = Rc::clone(&seen);
            registry.subscribe_to_slot(slot, &config, move |s, pair| {
                seen.borrow_mut().push((s, pair.clone()));
            });
        }
        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, slot);
        assert_eq!(seen[0].1.forward[0].expr, "to_ref_X");
    }

    #[test]
    fn menu_updates_on_every_table_mutation() {
        let config = config_with_space("X");
        let mut registry = SubscriptionRegistry::new();
        let menus = Rc::new(RefCell::new(Vec::new()));
        {
            let menus = Rc::clone(&menus);
            registry.subscribe_to_menu(move |items| {
                menus.borrow_mut().push(items.to_vec());
            });
        }
        let slot = Slot::new(3).unwrap();
        registry.set_subscription(slot, ItemKind::ColorSpace, "X", &config);
        registry.clear_slot(slot);

        let menus = menus.borrow();
        // immediate empty menu, one-entry menu, empty menu again
        assert_eq!(menus.len(), 3);
        assert!(menus[0].is_empty());
        assert_eq!(menus[1][0].label, "X");
        assert!(menus[2].is_empty());
    }

    #[test]
    fn init_fires_only_for_new_subscriptions() {
        let config = config_with_space("X");
        let mut registry = SubscriptionRegistry::new();
        let inits = Rc::new(RefCell::new(Vec::new()));
        {
            let inits = Rc::clone(&inits);
            registry.subscribe_to_init(move |slot| inits.borrow_mut().push(slot));
        }
        let slot = Slot::new(0).unwrap();
        registry.set_subscription(slot, ItemKind::ColorSpace, "X", &config);
        // Re-binding the same occupied slot is an update, not a creation
        registry.set_subscription(slot, ItemKind::ColorSpace, "X", &config);
        assert_eq!(inits.borrow().as_slice(), [slot]);
    }

    #[test]
    fn rename_keeps_slot_and_rebroadcasts_once() {
        let mut config = config_with_space("A");
        let mut registry = SubscriptionRegistry::new();
        let slot = Slot::new(3).unwrap();
        registry.set_subscription(slot, ItemKind::ColorSpace, "A", &config);

        let payloads = Rc::new(RefCell::new(Vec::new()));
        {
            let payloads = Rc::clone(&payloads);
            registry.subscribe_to_slot(slot, &config, move |_, pair| {
                payloads.borrow_mut().push(pair.clone());
            });
        }
        assert_eq!(payloads.borrow().len(), 1); // immediate update

        config
            .rename_item(ItemKind::ColorSpace, "A", "A2")
            .unwrap();
        registry.handle_rename(&config, ItemKind::ColorSpace, "A", "A2");

        assert_eq!(registry.slot_of(ItemKind::ColorSpace, "A2"), Some(slot));
        assert_eq!(registry.slot_of(ItemKind::ColorSpace, "A"), None);
        assert_eq!(payloads.borrow().len(), 2); // exactly one rebroadcast
    }

    #[test]
    fn reconcile_rebinds_renamed_items_after_a_config_swap() {
        let old_config = config_with_space("A");
        let mut new_config = old_config.clone();
        new_config
            .rename_item(ItemKind::ColorSpace, "A", "A2")
            .unwrap();

        let mut registry = SubscriptionRegistry::new();
        let slot = Slot::new(1).unwrap();
        registry.set_subscription(slot, ItemKind::ColorSpace, "A", &old_config);
        registry.handle_rename(&new_config, ItemKind::ColorSpace, "A", "A2");

        // Swap back to the pre-rename config (an undo)
        registry.reconcile(&old_config);
        assert_eq!(registry.slot_of(ItemKind::ColorSpace, "A"), Some(slot));
        assert_eq!(registry.slot_of(ItemKind::ColorSpace, "A2"), None);

        // And forward again (a redo)
        registry.reconcile(&new_config);
        assert_eq!(registry.slot_of(ItemKind::ColorSpace, "A2"), Some(slot));
    }

    #[test]
    fn slot_range_is_enforced() {
        assert!(Slot::new(9).is_ok());
        assert!(matches!(
            Slot::new(10),
            Err(StateError::SlotOutOfRange { slot: 10, .. })
        ));
    }

    #[test]
    fn badges_spread_hues_across_slots() {
        let badge0 = SlotBadge::for_slot(Slot::new(0).unwrap());
        let badge5 = SlotBadge::for_slot(Slot::new(5).unwrap());
        assert_eq!(badge0.hue, 0.0);
        assert_eq!(badge5.hue, 0.5);
    }
}
