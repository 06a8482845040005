//! Queue message, destination, and delivery types.

use chroma_config::{ProcessorPair, SnapshotBlob};

/// Severity of a routed log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Diagnostic detail.
    Debug,
    /// Normal operation.
    Info,
    /// Something degraded but recoverable.
    Warning,
    /// Something failed.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        write!(f, "{label}")
    }
}

/// One leveled log line routed to log viewers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Record severity.
    pub level: LogLevel,
    /// Record text.
    pub message: String,
}

impl LogRecord {
    /// Build a record.
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// A raw message pushed onto the router queue by the interactive thread.
///
/// Classification is purely structural; the worker dispatches on the
/// variant tag.
#[derive(Debug, Clone)]
pub enum QueueMessage {
    /// A full config snapshot to be rendered as display text.
    ConfigSnapshot(SnapshotBlob),
    /// A resolved processor to be rendered as shader and CTF text.
    Processor(ProcessorPair),
    /// Encoded image bytes to be decoded for display.
    Image(Vec<u8>),
    /// A leveled log record.
    Log(LogRecord),
}

/// The kind tag of a queue message, used for replay bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// [`QueueMessage::ConfigSnapshot`].
    ConfigSnapshot,
    /// [`QueueMessage::Processor`].
    Processor,
    /// [`QueueMessage::Image`].
    Image,
    /// [`QueueMessage::Log`].
    Log,
}

impl QueueMessage {
    /// The message's kind tag.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::ConfigSnapshot(_) => MessageKind::ConfigSnapshot,
            Self::Processor(_) => MessageKind::Processor,
            Self::Image(_) => MessageKind::Image,
            Self::Log(_) => MessageKind::Log,
        }
    }
}

/// A consumer endpoint for converted artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Pretty-formatted config text.
    ConfigText,
    /// Generated shader source.
    ShaderText,
    /// CTF-style XML.
    CtfText,
    /// Decoded image buffers.
    Image,
    /// Leveled log records.
    Log,
}

impl Destination {
    pub(crate) const ALL: [Self; 5] = [
        Self::ConfigText,
        Self::ShaderText,
        Self::CtfText,
        Self::Image,
        Self::Log,
    ];

    /// The message kind this destination consumes.
    pub fn source_kind(&self) -> MessageKind {
        match self {
            Self::ConfigText => MessageKind::ConfigSnapshot,
            Self::ShaderText | Self::CtfText => MessageKind::Processor,
            Self::Image => MessageKind::Image,
            Self::Log => MessageKind::Log,
        }
    }
}

/// A decoded RGBA8 image ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tightly packed RGBA8 pixel data, row-major.
    pub pixels: Vec<u8>,
}

/// A converted artifact delivered back to the interactive thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Pretty-formatted config text.
    ConfigText(String),
    /// Generated shader source.
    ShaderText(String),
    /// CTF-style XML.
    CtfText(String),
    /// Decoded image.
    Image(ImageBuffer),
    /// Leveled log record.
    Log(LogRecord),
}

impl Delivery {
    /// The destination this delivery is for.
    pub fn destination(&self) -> Destination {
        match self {
            Self::ConfigText(_) => Destination::ConfigText,
            Self::ShaderText(_) => Destination::ShaderText,
            Self::CtfText(_) => Destination::CtfText,
            Self::Image(_) => Destination::Image,
            Self::Log(_) => Destination::Log,
        }
    }
}
