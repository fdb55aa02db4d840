//! # PLC HMI
//!
//! Operator panel for a small serial-attached programmable controller,
//! built with the Bevy game engine and egui.
//!
//! The controller speaks a newline-delimited ASCII protocol: the host sends
//! lower-case commands (`start`, `mode auto`, `speed 12`, `status`, ...) and
//! the device answers with `STATUS KEY=VALUE ...` lines and free-text
//! diagnostics.
//!
//! ## Architecture
//!
//! - [`protocol`]: command encoding, line classification, status parsing
//! - [`device`]: the device state snapshot and its field-by-field merge
//! - [`link`]: serial transport, reader loop, poller and the event queue
//! - [`dispatch`]: operator intents mapped to protocol commands
//! - [`session`]: the coordination context and the presentation sink seam
//! - [`hmi`]: Bevy plugin and egui operator panel
//! - [`config`]: runtime configuration
//! - [`error`]: error types for the application

pub mod config;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod hmi;
pub mod link;
pub mod protocol;
pub mod session;

/// Re-exports for convenience
pub mod prelude {
    pub use crate::config::HmiConfig;
    pub use crate::device::{DeviceState, Mode};
    pub use crate::dispatch::{Command, CommandDispatcher};
    pub use crate::error::*;
    pub use crate::hmi::HmiPlugin;
    pub use crate::session::{PresentationSink, Session};
}
