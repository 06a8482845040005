//! The mutable config object and its entity accessors.
//!
//! A [`Config`] holds ordered collections of color spaces, looks, and
//! displays, plus a role table mapping well-known role names to color
//! spaces. All mutation goes through the accessors here; the state layer
//! never touches the collections directly.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Kind of named config item the editor can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemKind {
    /// Scene or display color space.
    ColorSpace,
    /// Creative look (transform applied in a process space).
    Look,
    /// Output display with its ordered views.
    Display,
}

impl ItemKind {
    /// Human-readable label for UI text and undo labels.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ColorSpace => "color space",
            Self::Look => "look",
            Self::Display => "display",
        }
    }

    /// Prefix used when generating default names for new items.
    pub fn name_prefix(&self) -> &'static str {
        match self {
            Self::ColorSpace => "ColorSpace_",
            Self::Look => "Look_",
            Self::Display => "Display_",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Editable field of a config item.
///
/// Field edits are the leaf unit of undo: each maps to exactly one setter
/// path, so re-applying an old value reuses the normal change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    /// Item name (setting it is a rename).
    Name,
    /// Color space family.
    Family,
    /// Color space encoding.
    Encoding,
    /// Color space to-reference transform expression.
    ToReference,
    /// Look process space (color space name, may be empty).
    ProcessSpace,
    /// Look transform expression.
    Transform,
}

impl Field {
    /// Short identifier used in error messages.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Family => "family",
            Self::Encoding => "encoding",
            Self::ToReference => "to_reference",
            Self::ProcessSpace => "process_space",
            Self::Transform => "transform",
        }
    }
}

/// A scene or display color space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSpace {
    /// Unique name within the config.
    pub name: String,
    /// Family grouping for UI menus.
    pub family: String,
    /// Encoding hint (scene-linear, log, sdr-video, ...).
    pub encoding: String,
    /// Alternate names that resolve to this space.
    pub aliases: Vec<String>,
    /// Categories for filtered listings.
    pub categories: Vec<String>,
    /// Transform expression converting this space to the reference space.
    pub to_reference: String,
}

impl ColorSpace {
    /// Create a color space with the given name and empty metadata.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            family: String::new(),
            encoding: String::new(),
            aliases: Vec::new(),
            categories: Vec::new(),
            to_reference: String::new(),
        }
    }
}

/// A creative look.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Look {
    /// Unique name within the config.
    pub name: String,
    /// Color space the look transform operates in. Empty means the
    /// reference space.
    pub process_space: String,
    /// Look transform expression.
    pub transform: String,
}

impl Look {
    /// Create a look with the given name, no process space, and an empty
    /// transform.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            process_space: String::new(),
            transform: String::new(),
        }
    }
}

/// One view of a display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct View {
    /// View name, unique within its display.
    pub name: String,
    /// Color space the view renders through.
    pub color_space: String,
    /// Optional look applied by the view (empty for none).
    pub look: String,
}

/// An output display and its ordered views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Display {
    /// Unique name within the config.
    pub name: String,
    /// Ordered views.
    pub views: Vec<View>,
}

impl Display {
    /// Create a display with the given name and no views.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            views: Vec::new(),
        }
    }
}

/// The shared mutable configuration object.
///
/// Exactly one thread (the interactive thread) may mutate a config; see the
/// concurrency notes in the workspace design document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    color_spaces: Vec<ColorSpace>,
    looks: Vec<Look>,
    displays: Vec<Display>,
    roles: BTreeMap<String, String>,
}

impl Config {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Check config consistency.
    ///
    /// A config is invalid while any item has an empty name, names collide
    /// within a kind (aliases included), or a look process space or view
    /// references a color space that does not resolve. Invalid states are
    /// expected mid-edit; fingerprinting refuses to run on them.
    pub fn validate(&self) -> Result<()> {
        let mut seen = Vec::new();
        for cs in &self.color_spaces {
            if cs.name.is_empty() {
                return Err(ConfigError::invalid_state("color space with empty name"));
            }
            for name in std::iter::once(&cs.name).chain(cs.aliases.iter()) {
                if seen.contains(&name.as_str()) {
                    return Err(ConfigError::invalid_state(format!(
                        "duplicate color space name or alias {name:?}"
                    )));
                }
                seen.push(name.as_str());
            }
        }
        let look_names: Vec<&str> = self.looks.iter().map(|l| l.name.as_str()).collect();
        let display_names: Vec<&str> = self.displays.iter().map(|d| d.name.as_str()).collect();
        for (list_kind, names) in [
            (ItemKind::Look, look_names),
            (ItemKind::Display, display_names),
        ] {
            let mut kind_seen: Vec<&str> = Vec::new();
            for name in names {
                if name.is_empty() {
                    return Err(ConfigError::invalid_state(format!(
                        "{list_kind} with empty name"
                    )));
                }
                if kind_seen.contains(&name) {
                    return Err(ConfigError::invalid_state(format!(
                        "duplicate {list_kind} name {name:?}"
                    )));
                }
                kind_seen.push(name);
            }
        }
        for look in &self.looks {
            if !look.process_space.is_empty() && self.color_space(&look.process_space).is_none() {
                return Err(ConfigError::invalid_state(format!(
                    "look {:?} references unknown process space {:?}",
                    look.name, look.process_space
                )));
            }
        }
        for display in &self.displays {
            for view in &display.views {
                if self.color_space(&view.color_space).is_none() {
                    return Err(ConfigError::invalid_state(format!(
                        "view {:?} of display {:?} references unknown color space {:?}",
                        view.name, display.name, view.color_space
                    )));
                }
                if !view.look.is_empty() && self.look(&view.look).is_none() {
                    return Err(ConfigError::invalid_state(format!(
                        "view {:?} of display {:?} references unknown look {:?}",
                        view.name, display.name, view.look
                    )));
                }
            }
        }
        Ok(())
    }

    // ========================================================================
    // Typed accessors
    // ========================================================================

    /// Look up a color space by name, alias, or role.
    pub fn color_space(&self, name: &str) -> Option<&ColorSpace> {
        let resolved = self.roles.get(name).map_or(name, String::as_str);
        self.color_spaces
            .iter()
            .find(|cs| cs.name == resolved || cs.aliases.iter().any(|a| a == resolved))
    }

    /// Look up a look by name.
    pub fn look(&self, name: &str) -> Option<&Look> {
        self.looks.iter().find(|l| l.name == name)
    }

    /// Look up a display by name.
    pub fn display(&self, name: &str) -> Option<&Display> {
        self.displays.iter().find(|d| d.name == name)
    }

    /// All color spaces in config order.
    pub fn color_spaces(&self) -> &[ColorSpace] {
        &self.color_spaces
    }

    /// All looks in config order.
    pub fn looks(&self) -> &[Look] {
        &self.looks
    }

    /// All displays in config order.
    pub fn displays(&self) -> &[Display] {
        &self.displays
    }

    /// The role table (role name to color space name).
    pub fn roles(&self) -> &BTreeMap<String, String> {
        &self.roles
    }

    /// Assign a role to a color space name.
    pub fn set_role(&mut self, role: impl Into<String>, color_space: impl Into<String>) {
        self.roles.insert(role.into(), color_space.into());
    }

    /// Add a color space, refusing names already in use anywhere.
    pub fn add_color_space(&mut self, cs: ColorSpace) -> Result<()> {
        self.check_name_free(&cs.name)?;
        for alias in &cs.aliases {
            self.check_name_free(alias)?;
        }
        self.color_spaces.push(cs);
        Ok(())
    }

    /// Add a look, refusing names already in use anywhere.
    pub fn add_look(&mut self, look: Look) -> Result<()> {
        self.check_name_free(&look.name)?;
        self.looks.push(look);
        Ok(())
    }

    /// Add a display, refusing names already in use anywhere.
    pub fn add_display(&mut self, display: Display) -> Result<()> {
        self.check_name_free(&display.name)?;
        self.displays.push(display);
        Ok(())
    }

    /// Append a view to a display.
    pub fn add_view(&mut self, display: &str, view: View) -> Result<()> {
        let display = self
            .displays
            .iter_mut()
            .find(|d| d.name == display)
            .ok_or_else(|| ConfigError::not_found(ItemKind::Display, display))?;
        display.views.push(view);
        Ok(())
    }

    /// Remove a view from a display.
    pub fn remove_view(&mut self, display: &str, view: &str) -> Result<View> {
        let display = self
            .displays
            .iter_mut()
            .find(|d| d.name == display)
            .ok_or_else(|| ConfigError::not_found(ItemKind::Display, display))?;
        let pos = display
            .views
            .iter()
            .position(|v| v.name == view)
            .ok_or_else(|| ConfigError::not_found(ItemKind::Display, view))?;
        Ok(display.views.remove(pos))
    }

    // ========================================================================
    // Generic item operations (keyed by kind)
    // ========================================================================

    /// Ordered item names for a kind.
    pub fn item_names(&self, kind: ItemKind) -> Vec<String> {
        match kind {
            ItemKind::ColorSpace => self.color_spaces.iter().map(|c| c.name.clone()).collect(),
            ItemKind::Look => self.looks.iter().map(|l| l.name.clone()).collect(),
            ItemKind::Display => self.displays.iter().map(|d| d.name.clone()).collect(),
        }
    }

    /// Row position of a named item within its kind.
    pub fn position_of(&self, kind: ItemKind, name: &str) -> Option<usize> {
        match kind {
            ItemKind::ColorSpace => self.color_spaces.iter().position(|c| c.name == name),
            ItemKind::Look => self.looks.iter().position(|l| l.name == name),
            ItemKind::Display => self.displays.iter().position(|d| d.name == name),
        }
    }

    /// Create a default-constructed item of the given kind and name.
    pub fn create_item(&mut self, kind: ItemKind, name: &str) -> Result<()> {
        match kind {
            ItemKind::ColorSpace => self.add_color_space(ColorSpace::new(name)),
            ItemKind::Look => self.add_look(Look::new(name)),
            ItemKind::Display => self.add_display(Display::new(name)),
        }
    }

    /// Remove a named item.
    pub fn remove_item(&mut self, kind: ItemKind, name: &str) -> Result<()> {
        let pos = self
            .position_of(kind, name)
            .ok_or_else(|| ConfigError::not_found(kind, name))?;
        match kind {
            ItemKind::ColorSpace => {
                self.color_spaces.remove(pos);
            }
            ItemKind::Look => {
                self.looks.remove(pos);
            }
            ItemKind::Display => {
                self.displays.remove(pos);
            }
        }
        Ok(())
    }

    /// Move a named item to a new row within its kind.
    pub fn move_item(&mut self, kind: ItemKind, name: &str, dst_row: usize) -> Result<()> {
        let src = self
            .position_of(kind, name)
            .ok_or_else(|| ConfigError::not_found(kind, name))?;
        match kind {
            ItemKind::ColorSpace => {
                let item = self.color_spaces.remove(src);
                let dst = dst_row.min(self.color_spaces.len());
                self.color_spaces.insert(dst, item);
            }
            ItemKind::Look => {
                let item = self.looks.remove(src);
                let dst = dst_row.min(self.looks.len());
                self.looks.insert(dst, item);
            }
            ItemKind::Display => {
                let item = self.displays.remove(src);
                let dst = dst_row.min(self.displays.len());
                self.displays.insert(dst, item);
            }
        }
        Ok(())
    }

    /// Rename a named item, rewriting references so the config stays
    /// resolvable (look process spaces, view references, role targets).
    pub fn rename_item(&mut self, kind: ItemKind, old: &str, new: &str) -> Result<()> {
        if old == new {
            return Ok(());
        }
        self.check_name_free(new)?;
        let pos = self
            .position_of(kind, old)
            .ok_or_else(|| ConfigError::not_found(kind, old))?;
        match kind {
            ItemKind::ColorSpace => {
                self.color_spaces[pos].name = new.to_string();
                for look in &mut self.looks {
                    if look.process_space == old {
                        look.process_space = new.to_string();
                    }
                }
                for display in &mut self.displays {
                    for view in &mut display.views {
                        if view.color_space == old {
                            view.color_space = new.to_string();
                        }
                    }
                }
                for target in self.roles.values_mut() {
                    if target == old {
                        *target = new.to_string();
                    }
                }
            }
            ItemKind::Look => {
                self.looks[pos].name = new.to_string();
                for display in &mut self.displays {
                    for view in &mut display.views {
                        if view.look == old {
                            view.look = new.to_string();
                        }
                    }
                }
            }
            ItemKind::Display => {
                self.displays[pos].name = new.to_string();
            }
        }
        Ok(())
    }

    // ========================================================================
    // Field access
    // ========================================================================

    /// Read a field of a named item.
    pub fn field(&self, kind: ItemKind, name: &str, field: Field) -> Result<String> {
        let missing = || ConfigError::not_found(kind, name);
        match (kind, field) {
            (_, Field::Name) => {
                self.position_of(kind, name).ok_or_else(missing)?;
                Ok(name.to_string())
            }
            (ItemKind::ColorSpace, Field::Family) => Ok(self
                .color_spaces
                .iter()
                .find(|c| c.name == name)
                .ok_or_else(missing)?
                .family
                .clone()),
            (ItemKind::ColorSpace, Field::Encoding) => Ok(self
                .color_spaces
                .iter()
                .find(|c| c.name == name)
                .ok_or_else(missing)?
                .encoding
                .clone()),
            (ItemKind::ColorSpace, Field::ToReference) => Ok(self
                .color_spaces
                .iter()
                .find(|c| c.name == name)
                .ok_or_else(missing)?
                .to_reference
                .clone()),
            (ItemKind::Look, Field::ProcessSpace) => {
                Ok(self.look(name).ok_or_else(missing)?.process_space.clone())
            }
            (ItemKind::Look, Field::Transform) => {
                Ok(self.look(name).ok_or_else(missing)?.transform.clone())
            }
            _ => Err(ConfigError::NoSuchField {
                kind,
                field: field.id().to_string(),
            }),
        }
    }

    /// Write a field of a named item through the one setter path for that
    /// field. Setting [`Field::Name`] is a rename.
    pub fn set_field(&mut self, kind: ItemKind, name: &str, field: Field, value: &str) -> Result<()> {
        let missing = || ConfigError::not_found(kind, name);
        match (kind, field) {
            (_, Field::Name) => self.rename_item(kind, name, value),
            (ItemKind::ColorSpace, Field::Family) => {
                let cs = self
                    .color_spaces
                    .iter_mut()
                    .find(|c| c.name == name)
                    .ok_or_else(missing)?;
                cs.family = value.to_string();
                Ok(())
            }
            (ItemKind::ColorSpace, Field::Encoding) => {
                let cs = self
                    .color_spaces
                    .iter_mut()
                    .find(|c| c.name == name)
                    .ok_or_else(missing)?;
                cs.encoding = value.to_string();
                Ok(())
            }
            (ItemKind::ColorSpace, Field::ToReference) => {
                let cs = self
                    .color_spaces
                    .iter_mut()
                    .find(|c| c.name == name)
                    .ok_or_else(missing)?;
                cs.to_reference = value.to_string();
                Ok(())
            }
            (ItemKind::Look, Field::ProcessSpace) => {
                let look = self
                    .looks
                    .iter_mut()
                    .find(|l| l.name == name)
                    .ok_or_else(missing)?;
                look.process_space = value.to_string();
                Ok(())
            }
            (ItemKind::Look, Field::Transform) => {
                let look = self
                    .looks
                    .iter_mut()
                    .find(|l| l.name == name)
                    .ok_or_else(missing)?;
                look.transform = value.to_string();
                Ok(())
            }
            _ => Err(ConfigError::NoSuchField {
                kind,
                field: field.id().to_string(),
            }),
        }
    }

    // ========================================================================
    // Name bookkeeping
    // ========================================================================

    /// Every name in use anywhere in the config: item names, color space
    /// aliases, and role names. New items must not collide with any of
    /// these.
    pub fn all_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .color_spaces
            .iter()
            .flat_map(|c| std::iter::once(c.name.clone()).chain(c.aliases.iter().cloned()))
            .collect();
        names.extend(self.looks.iter().map(|l| l.name.clone()));
        names.extend(self.displays.iter().map(|d| d.name.clone()));
        names.extend(self.roles.keys().cloned());
        names
    }

    /// Generate the next free default name for a kind (`ColorSpace_1`,
    /// `ColorSpace_2`, ...).
    pub fn next_name(&self, kind: ItemKind) -> String {
        let taken = self.all_names();
        let prefix = kind.name_prefix();
        (1..)
            .map(|n| format!("{prefix}{n}"))
            .find(|candidate| !taken.iter().any(|t| t == candidate))
            .unwrap_or_else(|| format!("{prefix}1"))
    }

    /// Render the whole config as human-readable text (the router's config
    /// text destination).
    pub fn to_pretty_text(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::SnapshotEncode {
            reason: e.to_string(),
        })
    }

    fn check_name_free(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(ConfigError::invalid_state("empty item name"));
        }
        if self.all_names().iter().any(|n| n == name) {
            return Err(ConfigError::NameInUse {
                name: name.to_string(),
            });
        }
        Ok(())
    }
}
