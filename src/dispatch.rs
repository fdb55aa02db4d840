//! # Dispatch Module
//!
//! Maps operator intents onto protocol commands. Every operation is
//! fire-and-forget: one write, no acknowledgement awaited.

use std::fmt;

use log::{debug, warn};

use crate::link::{CommandWriter, EventSender, LinkEvent};
use crate::protocol::encode_command;

/// Advisory logged when the auto timing entries are not integers.
pub const AUTO_PARAMS_ADVICE: &str = "[GUI] enter numbers for run/stop ms";

/// Commands understood by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Status,
    Start,
    Stop,
    Fault,
    Reset,
    ModeManual,
    ModeAuto,
    AutoStart,
    AutoStop,
    JogOn,
    JogOff,
    Speed(i32),
    StepsReset,
    AutoParams { run_ms: i64, stop_ms: i64 },
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Status => write!(f, "status"),
            Command::Start => write!(f, "start"),
            Command::Stop => write!(f, "stop"),
            Command::Fault => write!(f, "fault"),
            Command::Reset => write!(f, "reset"),
            Command::ModeManual => write!(f, "mode manual"),
            Command::ModeAuto => write!(f, "mode auto"),
            Command::AutoStart => write!(f, "auto start"),
            Command::AutoStop => write!(f, "auto stop"),
            Command::JogOn => write!(f, "jog on"),
            Command::JogOff => write!(f, "jog off"),
            Command::Speed(speed) => write!(f, "speed {speed}"),
            Command::StepsReset => write!(f, "steps reset"),
            Command::AutoParams { run_ms, stop_ms } => {
                write!(f, "autoparam runms {run_ms} stopms {stop_ms}")
            }
        }
    }
}

/// Sends operator commands through a [`CommandWriter`].
///
/// Write failures and input advisories are posted to the session as
/// [`LinkEvent`]s rather than returned.
pub struct CommandDispatcher<W> {
    writer: W,
    events: EventSender,
}

impl<W: CommandWriter> CommandDispatcher<W> {
    pub fn new(writer: W, events: EventSender) -> Self {
        Self { writer, events }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Encodes and writes one command.
    pub fn send(&mut self, command: Command) {
        let line = command.to_string();
        debug!("tx: {line}");
        if let Err(e) = self.writer.write_line(&encode_command(&line)) {
            warn!("dropping `{line}`: {e}");
            let _ = self.events.send(LinkEvent::WriteError(e.to_string()));
        }
    }

    pub fn poll_status(&mut self) {
        self.send(Command::Status);
    }

    pub fn start(&mut self) {
        self.send(Command::Start);
    }

    pub fn stop(&mut self) {
        self.send(Command::Stop);
    }

    pub fn fault(&mut self) {
        self.send(Command::Fault);
    }

    pub fn reset(&mut self) {
        self.send(Command::Reset);
    }

    pub fn set_mode_manual(&mut self) {
        self.send(Command::ModeManual);
    }

    pub fn set_mode_auto(&mut self) {
        self.send(Command::ModeAuto);
    }

    pub fn auto_start(&mut self) {
        self.send(Command::AutoStart);
    }

    pub fn auto_stop(&mut self) {
        self.send(Command::AutoStop);
    }

    /// Press edge of the momentary jog control. Must be paired with [`Self::jog_off`].
    pub fn jog_on(&mut self) {
        self.send(Command::JogOn);
    }

    /// Release edge of the momentary jog control.
    pub fn jog_off(&mut self) {
        self.send(Command::JogOff);
    }

    /// Sends the rounded speed; values that do not fit an integer are dropped silently.
    pub fn set_speed(&mut self, value: f64) {
        match round_speed(value) {
            Some(speed) => self.send(Command::Speed(speed)),
            None => debug!("ignoring speed value {value}"),
        }
    }

    pub fn reset_steps(&mut self) {
        self.send(Command::StepsReset);
    }

    /// Sends new auto timings, or logs an advisory if either entry is not an integer.
    pub fn set_auto_params(&mut self, run_ms: &str, stop_ms: &str) {
        match (run_ms.trim().parse::<i64>(), stop_ms.trim().parse::<i64>()) {
            (Ok(run_ms), Ok(stop_ms)) => self.send(Command::AutoParams { run_ms, stop_ms }),
            _ => {
                debug!("rejecting auto params {run_ms:?}/{stop_ms:?}");
                let _ = self.events.send(LinkEvent::Notice(AUTO_PARAMS_ADVICE.to_string()));
            }
        }
    }
}

fn round_speed(value: f64) -> Option<i32> {
    let rounded = value.round();
    if rounded.is_finite() && rounded >= f64::from(i32::MIN) && rounded <= f64::from(i32::MAX) {
        Some(rounded as i32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HmiError;
    use crate::link::transport::MockCommandWriter;
    use crate::link::{EventReceiver, event_channel};

    fn expect_writes(lines: &'static [&'static [u8]]) -> MockCommandWriter {
        let mut writer = MockCommandWriter::new();
        let mut seq = mockall::Sequence::new();
        for expected in lines {
            writer
                .expect_write_line()
                .withf(move |line| line[..] == expected[..])
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(()));
        }
        writer
    }

    fn dispatcher(writer: MockCommandWriter) -> (CommandDispatcher<MockCommandWriter>, EventReceiver) {
        let (events, rx) = event_channel();
        (CommandDispatcher::new(writer, events), rx)
    }

    #[test]
    fn test_intent_commands() {
        let writer = expect_writes(&[
            b"status\n",
            b"start\n",
            b"stop\n",
            b"fault\n",
            b"reset\n",
            b"mode manual\n",
            b"mode auto\n",
            b"auto start\n",
            b"auto stop\n",
            b"jog on\n",
            b"jog off\n",
            b"steps reset\n",
        ]);
        let (mut dispatcher, mut rx) = dispatcher(writer);

        dispatcher.poll_status();
        dispatcher.start();
        dispatcher.stop();
        dispatcher.fault();
        dispatcher.reset();
        dispatcher.set_mode_manual();
        dispatcher.set_mode_auto();
        dispatcher.auto_start();
        dispatcher.auto_stop();
        dispatcher.jog_on();
        dispatcher.jog_off();
        dispatcher.reset_steps();

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_auto_params_sent() {
        let (mut dispatcher, mut rx) =
            dispatcher(expect_writes(&[b"autoparam runms 4000 stopms 2000\n"]));
        dispatcher.set_auto_params("4000", "2000");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_auto_params_trimmed() {
        let (mut dispatcher, _rx) =
            dispatcher(expect_writes(&[b"autoparam runms 150 stopms 75\n"]));
        dispatcher.set_auto_params(" 150 ", "75\n");
    }

    #[test]
    fn test_auto_params_forward_any_integer() {
        let (mut dispatcher, mut rx) = dispatcher(expect_writes(&[
            b"autoparam runms -500 stopms 2000\n",
            b"autoparam runms 5000000000 stopms 0\n",
        ]));
        dispatcher.set_auto_params("-500", "2000");
        dispatcher.set_auto_params("5000000000", "0");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_auto_params_rejected() {
        let mut writer = MockCommandWriter::new();
        writer.expect_write_line().times(0);
        let (mut dispatcher, mut rx) = dispatcher(writer);

        dispatcher.set_auto_params("abc", "2000");
        dispatcher.set_auto_params("1.5", "2000");

        for _ in 0..2 {
            assert_eq!(
                rx.try_recv().ok(),
                Some(LinkEvent::Notice(AUTO_PARAMS_ADVICE.to_string()))
            );
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_speed_is_rounded() {
        let (mut dispatcher, _rx) =
            dispatcher(expect_writes(&[b"speed 12\n", b"speed 13\n", b"speed 1\n"]));
        dispatcher.set_speed(12.0);
        dispatcher.set_speed(12.6);
        dispatcher.set_speed(1.2);
    }

    #[test]
    fn test_unrepresentable_speed_is_dropped() {
        let mut writer = MockCommandWriter::new();
        writer.expect_write_line().times(0);
        let (mut dispatcher, mut rx) = dispatcher(writer);

        dispatcher.set_speed(f64::NAN);
        dispatcher.set_speed(f64::INFINITY);
        dispatcher.set_speed(1e12);

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_write_error_is_reported() {
        let mut writer = MockCommandWriter::new();
        writer
            .expect_write_line()
            .times(1)
            .returning(|_| Err(HmiError::port_write("device unplugged")));
        let (mut dispatcher, mut rx) = dispatcher(writer);

        dispatcher.start();

        match rx.try_recv() {
            Ok(LinkEvent::WriteError(detail)) => assert!(detail.contains("device unplugged")),
            other => panic!("expected write error, got {other:?}"),
        }
    }

    #[test]
    fn test_command_text() {
        assert_eq!(Command::Speed(7).to_string(), "speed 7");
        assert_eq!(
            Command::AutoParams {
                run_ms: 1,
                stop_ms: 2
            }
            .to_string(),
            "autoparam runms 1 stopms 2"
        );
    }
}
