//! # Link Module
//!
//! Everything that touches the serial transport. Background tasks never
//! call into the session directly: they post [`LinkEvent`]s on an unbounded
//! queue that the session drains on its own thread.

pub mod poller;
pub mod reader;
pub mod transport;

use tokio::sync::mpsc;

use crate::protocol::Line;

pub use poller::Poller;
pub use reader::run_reader;
pub use transport::{ChannelWriter, CommandWriter, LineSource, SerialLink, SerialLineSource};

/// Notifications posted to the coordination context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A non-empty line read from the device, already classified.
    Received { raw: String, line: Line },
    /// A read attempt failed; the reader is backing off.
    ReadError(String),
    /// A command could not be written.
    WriteError(String),
    /// The port could not be opened.
    OpenError(String),
    /// Operator-facing advisory, logged verbatim.
    Notice(String),
}

/// Sending half of the event queue. Cheap to clone.
pub type EventSender = mpsc::UnboundedSender<LinkEvent>;

/// Receiving half of the event queue, owned by the session.
pub type EventReceiver = mpsc::UnboundedReceiver<LinkEvent>;

/// Creates the event queue.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
