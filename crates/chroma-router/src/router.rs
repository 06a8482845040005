//! The background worker and its control surface.
//!
//! One queue, one consumer thread. The interactive thread is the sole
//! producer, so messages reach the worker strictly in enqueue order and the
//! worker finishes one message's conversions before dequeuing the next.
//! Interest flips and shutdown travel on the same queue as data, which keeps
//! them FIFO-ordered relative to the messages around them.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chroma_config::processor::{ctf_text, shader_text};
use chroma_config::{Config, ProcessorPair, Snapshot, SnapshotBlob};

use crate::error::{Result, RouterError};
use crate::message::{Delivery, Destination, ImageBuffer, LogRecord, QueueMessage};

/// How long the worker blocks on one dequeue before rechecking for control
/// traffic. Shutdown is granted twice this as a grace window.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

enum Command {
    Message(QueueMessage),
    SetInterest(Destination, bool),
    Stop,
}

/// Handle to the background router: enqueue raw messages, flip interest
/// flags, drain deliveries, and shut the worker down.
///
/// Enqueue is fire-and-forget; the interactive thread never blocks on the
/// worker.
pub struct NotificationRouter {
    commands: Sender<Command>,
    deliveries: Receiver<Delivery>,
    done: Receiver<()>,
    worker: Option<JoinHandle<()>>,
}

impl NotificationRouter {
    /// Spawn the worker thread and return its control handle.
    pub fn spawn() -> Self {
        let (commands, command_rx) = mpsc::channel();
        let (delivery_tx, deliveries) = mpsc::channel();
        let (done_tx, done) = mpsc::channel();

        let worker = thread::spawn(move || {
            Worker::new(delivery_tx).run(&command_rx);
            let _ = done_tx.send(());
        });

        tracing::debug!("router worker started");
        Self {
            commands,
            deliveries,
            done,
            worker: Some(worker),
        }
    }

    /// Push a raw message onto the queue.
    pub fn enqueue(&self, message: QueueMessage) {
        let _ = self.commands.send(Command::Message(message));
    }

    /// Flip a destination's interest flag.
    ///
    /// Turning a destination on replays the most recently seen raw message
    /// of its kind exactly once, so the consumer does not wait for the next
    /// organic update. Turning it off suppresses future conversion and
    /// delivery; an already-started conversion is not aborted.
    pub fn set_interest(&self, destination: Destination, interested: bool) {
        let _ = self
            .commands
            .send(Command::SetInterest(destination, interested));
    }

    /// Drain every delivery currently waiting, without blocking.
    pub fn poll_deliveries(&self) -> Vec<Delivery> {
        let mut out = Vec::new();
        while let Ok(delivery) = self.deliveries.try_recv() {
            out.push(delivery);
        }
        out
    }

    /// Wait up to `timeout` for one delivery.
    pub fn recv_delivery_timeout(&self, timeout: Duration) -> Option<Delivery> {
        self.deliveries.recv_timeout(timeout).ok()
    }

    /// Stop the worker and wait for it to finish.
    ///
    /// The stop request queues behind any pending messages; the grace
    /// window is twice the poll interval. Missing it means the worker is
    /// stuck, which callers must treat as fatal.
    pub fn shutdown(mut self) -> Result<()> {
        if self.commands.send(Command::Stop).is_err() {
            if let Some(handle) = self.worker.take() {
                let _ = handle.join();
            }
            return Err(RouterError::WorkerGone);
        }
        let grace = POLL_INTERVAL * 2;
        match self.done.recv_timeout(grace) {
            Ok(()) => {
                if let Some(handle) = self.worker.take() {
                    let _ = handle.join();
                }
                tracing::debug!("router worker stopped");
                Ok(())
            }
            Err(_) => Err(RouterError::ShutdownTimeout {
                waited_ms: grace.as_millis() as u64,
            }),
        }
    }
}

impl Drop for NotificationRouter {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Stop);
    }
}

/// Worker-side state: interest flags plus the last raw message of each
/// kind, retained for single replay on a false-to-true interest flip.
struct Worker {
    deliveries: Sender<Delivery>,
    interested: [bool; Destination::ALL.len()],
    last_config: Option<SnapshotBlob>,
    last_processor: Option<ProcessorPair>,
    last_image: Option<Vec<u8>>,
    last_log: Option<LogRecord>,
}

impl Worker {
    fn new(deliveries: Sender<Delivery>) -> Self {
        let mut interested = [false; Destination::ALL.len()];
        interested[Self::index(Destination::Log)] = true;
        Self {
            deliveries,
            interested,
            last_config: None,
            last_processor: None,
            last_image: None,
            last_log: None,
        }
    }

    fn run(mut self, commands: &Receiver<Command>) {
        loop {
            match commands.recv_timeout(POLL_INTERVAL) {
                Ok(Command::Message(message)) => self.handle(message),
                Ok(Command::SetInterest(destination, interested)) => {
                    self.set_interest(destination, interested);
                }
                Ok(Command::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }
        }
    }

    fn handle(&mut self, message: QueueMessage) {
        let kind = message.kind();
        match message {
            QueueMessage::ConfigSnapshot(blob) => self.last_config = Some(blob),
            QueueMessage::Processor(pair) => self.last_processor = Some(pair),
            QueueMessage::Image(bytes) => self.last_image = Some(bytes),
            QueueMessage::Log(record) => self.last_log = Some(record),
        }
        for destination in Destination::ALL {
            if destination.source_kind() == kind && self.interested[Self::index(destination)] {
                self.convert_and_deliver(destination);
            }
        }
    }

    fn set_interest(&mut self, destination: Destination, interested: bool) {
        let index = Self::index(destination);
        let was = self.interested[index];
        self.interested[index] = interested;
        if interested && !was {
            // Single replay of the last raw message of the matching kind.
            self.convert_and_deliver(destination);
        }
    }

    fn convert_and_deliver(&mut self, destination: Destination) {
        match self.convert(destination) {
            Some(Ok(delivery)) => {
                let _ = self.deliveries.send(delivery);
            }
            Some(Err(error)) => {
                tracing::warn!(?destination, %error, "conversion failed; skipping destination");
            }
            None => {}
        }
    }

    /// Run one destination's conversion against the last raw message of
    /// its kind. `None` means no such message has been seen yet.
    fn convert(&self, destination: Destination) -> Option<std::result::Result<Delivery, String>> {
        match destination {
            Destination::ConfigText => self.last_config.as_ref().map(|blob| {
                Config::restore(blob)
                    .and_then(|config| config.to_pretty_text())
                    .map(Delivery::ConfigText)
                    .map_err(|e| e.to_string())
            }),
            Destination::ShaderText => self.last_processor.as_ref().map(|pair| {
                shader_text(pair)
                    .map(Delivery::ShaderText)
                    .map_err(|e| e.to_string())
            }),
            Destination::CtfText => self
                .last_processor
                .as_ref()
                .map(|pair| Ok(Delivery::CtfText(ctf_text(pair)))),
            Destination::Image => self.last_image.as_ref().map(|bytes| {
                image::load_from_memory(bytes)
                    .map(|decoded| {
                        let rgba = decoded.to_rgba8();
                        Delivery::Image(ImageBuffer {
                            width: rgba.width(),
                            height: rgba.height(),
                            pixels: rgba.into_raw(),
                        })
                    })
                    .map_err(|e| e.to_string())
            }),
            Destination::Log => self
                .last_log
                .clone()
                .map(|record| Ok(Delivery::Log(record))),
        }
    }

    fn index(destination: Destination) -> usize {
        match destination {
            Destination::ConfigText => 0,
            Destination::ShaderText => 1,
            Destination::CtfText => 2,
            Destination::Image => 3,
            Destination::Log => 4,
        }
    }
}
