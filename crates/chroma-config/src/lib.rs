//! In-memory color pipeline configuration model.
//!
//! This crate is the config collaborator for the Chroma Studio editor core.
//! It owns the mutable config object that every editor panel reads and
//! writes, and exposes the three capabilities the state layer depends on:
//!
//! - entity accessors (get/list/insert/remove/move/rename and typed field
//!   get/set per item kind), treated as opaque by the rest of the system;
//! - a cheap content [`Fingerprint`] over the whole config, which fails
//!   while the config is in a transiently inconsistent state;
//! - full-state [`Snapshot`] save/restore, used only by the undo engine and
//!   treated as opaque bytes everywhere else.
//!
//! Transform resolution ([`Config::resolve_processor`]) and the derived
//! artifact generators ([`processor::shader_text`], [`processor::ctf_text`])
//! live here as well, since they need config internals the other crates
//! never see.

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod processor;
pub mod snapshot;

pub use config::{ColorSpace, Config, Display, Field, ItemKind, Look, View};
pub use error::{ConfigError, Result};
pub use fingerprint::Fingerprint;
pub use processor::{ProcessorPair, Transform};
pub use snapshot::{Snapshot, SnapshotBlob};
