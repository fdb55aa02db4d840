//! # Session Module
//!
//! The coordination context. A [`Session`] owns the [`DeviceState`], the
//! command dispatcher and the presentation sink, and is the only place the
//! state is mutated. Background tasks reach it exclusively through the
//! [`LinkEvent`] queue, drained by [`Session::pump`].

use log::info;

use crate::config::HmiConfig;
use crate::device::DeviceState;
use crate::dispatch::CommandDispatcher;
use crate::link::{CommandWriter, EventReceiver, EventSender, LinkEvent};
use crate::protocol::Line;

/// Receiver of everything the core reports outward.
#[cfg_attr(test, mockall::automock)]
pub trait PresentationSink {
    /// Called after a status line has been applied.
    fn on_state_changed(&mut self, state: &DeviceState);
    /// Called for every device line and every local diagnostic.
    fn on_log_line(&mut self, line: &str);
}

/// Owns the device state and serialises all work touching it.
pub struct Session<W, S> {
    state: DeviceState,
    dispatcher: CommandDispatcher<W>,
    sink: S,
    events: EventReceiver,
}

impl<W: CommandWriter, S: PresentationSink> Session<W, S> {
    /// Builds a session around an already-created event queue.
    ///
    /// `sender` is the sending half of `events`; the dispatcher reports
    /// write failures through it.
    pub fn new(
        config: &HmiConfig,
        writer: W,
        sink: S,
        sender: EventSender,
        events: EventReceiver,
    ) -> Self {
        Self {
            state: DeviceState::from_config(config),
            dispatcher: CommandDispatcher::new(writer, sender),
            sink,
            events,
        }
    }

    /// Emits the startup banner and publishes the initial state.
    pub fn announce(&mut self, port_name: &str) {
        self.sink.on_log_line("HMI started.");
        self.sink
            .on_log_line("If you get 'Resource busy': close any other serial monitor using the port.");
        self.sink.on_log_line(&format!("Port: {port_name}"));
        self.sink.on_state_changed(&self.state);
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn dispatcher(&mut self) -> &mut CommandDispatcher<W> {
        &mut self.dispatcher
    }

    /// Handles every queued event, in arrival order. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events.try_recv() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    /// Routes one event to the state and the sink.
    pub fn handle(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::Received { raw, line } => match line {
                Line::Empty => {}
                Line::Plain(_) => self.sink.on_log_line(&raw),
                Line::Status(update) => {
                    self.sink.on_log_line(&raw);
                    self.state.apply(&update);
                    self.sink.on_state_changed(&self.state);
                }
            },
            LinkEvent::ReadError(detail) => self.sink.on_log_line(&format!("[READ ERR] {detail}")),
            LinkEvent::WriteError(detail) => self.sink.on_log_line(&format!("[WRITE ERR] {detail}")),
            LinkEvent::OpenError(detail) => {
                info!("running without a serial link");
                self.sink.on_log_line(&format!("[OPEN ERR] {detail}"));
            }
            LinkEvent::Notice(message) => self.sink.on_log_line(&message),
        }
    }
}
