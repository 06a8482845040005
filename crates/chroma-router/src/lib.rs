//! Background notification routing for the Chroma Studio editor.
//!
//! The interactive thread pushes raw artifacts (config snapshots, resolved
//! processors, encoded images, log records) onto a FIFO queue; one worker
//! thread drains it and converts each message to its expensive display form
//! only for destinations that are currently interested. Results travel back
//! over a delivery channel the interactive thread polls.
//!
//! The interest flags are the cancellation primitive: flipping one off
//! suppresses conversion and delivery, flipping one on replays the most
//! recent raw message of its kind exactly once. Shutdown is cooperative
//! with a bounded grace window; see [`NotificationRouter::shutdown`].

pub mod error;
pub mod message;
pub mod router;

pub use error::{Result, RouterError};
pub use message::{
    Delivery, Destination, ImageBuffer, LogLevel, LogRecord, MessageKind, QueueMessage,
};
pub use router::{NotificationRouter, POLL_INTERVAL};
