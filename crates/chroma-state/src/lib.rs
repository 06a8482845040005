//! Interactive-thread state for the Chroma Studio editor core.
//!
//! Everything in this crate runs on the interactive thread and is owned by
//! one explicitly constructed [`EditorSession`]:
//!
//! - [`cache::FingerprintCache`] memoizes derived read-queries against the
//!   config's content fingerprint and broadcasts invalidation waves;
//! - [`undo::UndoStack`] records reversible edits as field edits or full
//!   before/after snapshots on a single linear stack;
//! - [`subscription::SubscriptionRegistry`] maps ten slots to named config
//!   items and rebroadcasts their resolved processors on change or rename;
//! - [`events::EventBus`] fans model events out to UI observers in
//!   registration order.
//!
//! None of this state is shared across threads; the single-mutator
//! invariant (only the interactive thread touches the config) is what lets
//! every structure here stay lock-free.

pub mod cache;
pub mod error;
pub mod events;
pub mod session;
pub mod subscription;
pub mod undo;

pub use cache::{FingerprintCache, Query};
pub use error::{Result, StateError};
pub use events::{Event, EventBus, SubscriberId};
pub use session::EditorSession;
pub use subscription::{MenuItem, Slot, SlotBadge, SubscriptionRegistry};
pub use undo::{StateCapture, UndoRecord, UndoStack};
