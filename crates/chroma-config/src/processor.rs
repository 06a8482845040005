//! Processor resolution and derived artifact generation.
//!
//! Resolving a named item yields a [`ProcessorPair`]: the forward and
//! inverse transform chains that take scene-reference pixels through that
//! item. Processors are independently constructed values that never alias
//! the live config, which is what makes them safe to hand to the
//! notification router's worker thread.

use serde::{Deserialize, Serialize};

use crate::config::{Config, ItemKind};
use crate::error::{ConfigError, Result};

/// One step of a transform chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transform {
    /// Opaque transform expression from the config.
    pub expr: String,
    /// Whether the step runs in the inverse direction.
    pub inverted: bool,
}

impl Transform {
    /// Forward step.
    pub fn forward(expr: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            inverted: false,
        }
    }

    /// Flip the direction of this step.
    pub fn inverted(mut self) -> Self {
        self.inverted = !self.inverted;
        self
    }
}

/// Forward and inverse transform chains for one resolved item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProcessorPair {
    /// Scene reference to item.
    pub forward: Vec<Transform>,
    /// Item back to scene reference.
    pub inverse: Vec<Transform>,
}

impl ProcessorPair {
    /// Build a pair from a forward chain; the inverse is the reversed
    /// chain with every step's direction flipped.
    pub fn from_forward(forward: Vec<Transform>) -> Self {
        let inverse = forward
            .iter()
            .rev()
            .cloned()
            .map(Transform::inverted)
            .collect();
        Self { forward, inverse }
    }
}

impl Config {
    /// Resolve the processor pair for a named item.
    ///
    /// Fails when the item is missing or its transform chain references a
    /// name that does not resolve.
    pub fn resolve_processor(&self, kind: ItemKind, name: &str) -> Result<ProcessorPair> {
        let unresolvable = |reason: String| ConfigError::Unresolvable {
            kind,
            name: name.to_string(),
            reason,
        };
        match kind {
            ItemKind::ColorSpace => {
                let cs = self
                    .color_space(name)
                    .ok_or_else(|| ConfigError::not_found(kind, name))?;
                let mut chain = Vec::new();
                if !cs.to_reference.is_empty() {
                    chain.push(Transform::forward(&cs.to_reference));
                }
                Ok(ProcessorPair::from_forward(chain))
            }
            ItemKind::Look => {
                let look = self
                    .look(name)
                    .ok_or_else(|| ConfigError::not_found(kind, name))?;
                let mut chain = Vec::new();
                if !look.process_space.is_empty() {
                    let process = self.color_space(&look.process_space).ok_or_else(|| {
                        unresolvable(format!(
                            "process space {:?} does not resolve",
                            look.process_space
                        ))
                    })?;
                    if !process.to_reference.is_empty() {
                        // Enter the process space before applying the look.
                        chain.push(Transform::forward(&process.to_reference).inverted());
                    }
                }
                if !look.transform.is_empty() {
                    chain.push(Transform::forward(&look.transform));
                }
                Ok(ProcessorPair::from_forward(chain))
            }
            ItemKind::Display => {
                let display = self
                    .display(name)
                    .ok_or_else(|| ConfigError::not_found(kind, name))?;
                let view = display
                    .views
                    .first()
                    .ok_or_else(|| unresolvable("display has no views".to_string()))?;
                let cs = self.color_space(&view.color_space).ok_or_else(|| {
                    unresolvable(format!(
                        "view color space {:?} does not resolve",
                        view.color_space
                    ))
                })?;
                let mut chain = Vec::new();
                if !view.look.is_empty() {
                    let look = self
                        .look(&view.look)
                        .ok_or_else(|| unresolvable(format!("look {:?} does not resolve", view.look)))?;
                    if !look.transform.is_empty() {
                        chain.push(Transform::forward(&look.transform));
                    }
                }
                if !cs.to_reference.is_empty() {
                    // Display direction: reference into the view's space.
                    chain.push(Transform::forward(&cs.to_reference).inverted());
                }
                Ok(ProcessorPair::from_forward(chain))
            }
        }
    }
}

/// Generate GLSL-ish shader source for a processor's forward chain.
///
/// The expression language is opaque; each step becomes one call in the
/// generated pixel function. Fails on an empty chain since there is
/// nothing to compile.
pub fn shader_text(pair: &ProcessorPair) -> Result<String> {
    if pair.forward.is_empty() {
        return Err(ConfigError::invalid_state(
            "cannot generate shader for an empty transform chain",
        ));
    }
    let mut out = String::from("vec4 chroma_apply(vec4 inPixel)\n{\n    vec4 pix = inPixel;\n");
    for (i, step) in pair.forward.iter().enumerate() {
        let dir = if step.inverted { "inverse" } else { "forward" };
        out.push_str(&format!(
            "    pix = apply_transform_{i}(pix); // {dir}: {}\n",
            step.expr
        ));
    }
    out.push_str("    return pix;\n}\n");
    Ok(out)
}

/// Generate CTF-style XML for a processor's forward chain.
pub fn ctf_text(pair: &ProcessorPair) -> String {
    let mut out = String::from("<ProcessList version=\"2.0\">\n");
    for step in &pair.forward {
        let dir = if step.inverted { "inverse" } else { "forward" };
        out.push_str(&format!(
            "  <Transform direction=\"{dir}\" expr=\"{}\"/>\n",
            step.expr
        ));
    }
    out.push_str("</ProcessList>\n");
    out
}
