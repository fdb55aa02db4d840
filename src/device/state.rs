//! # Device State
//!
//! The canonical snapshot of the controller, refreshed field by field from
//! status lines.

use std::fmt;

use log::debug;

use crate::config::HmiConfig;
use crate::protocol::status::{StatusKey, StatusUpdate, parse_flag, parse_number};

/// Operating mode reported by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Manual,
    Auto,
    /// Any mode string this build does not know, upper-cased.
    Other(String),
}

impl Mode {
    /// Maps a raw `MODE=` value; the value is upper-cased and never rejected.
    pub fn from_wire(value: &str) -> Self {
        let value = value.to_uppercase();
        match value.as_str() {
            "MANUAL" => Mode::Manual,
            "AUTO" => Mode::Auto,
            _ => Mode::Other(value),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Mode::Manual => "MANUAL",
            Mode::Auto => "AUTO",
            Mode::Other(other) => other,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lamp states derived from a [`DeviceState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Indicators {
    pub run: bool,
    pub stop: bool,
    pub fault: bool,
    pub relay: bool,
}

/// Snapshot of the controller status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceState {
    pub mode: Mode,
    pub running: bool,
    pub fault: bool,
    pub relay_engaged: bool,
    /// Meaningful range is 1..=18, not enforced on receipt.
    pub speed: i32,
    pub steps: u64,
    pub auto_running: bool,
    pub auto_run_ms: u32,
    pub auto_stop_ms: u32,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            mode: Mode::Manual,
            running: false,
            fault: false,
            relay_engaged: false,
            speed: 10,
            steps: 0,
            auto_running: false,
            auto_run_ms: 4000,
            auto_stop_ms: 2000,
        }
    }
}

impl DeviceState {
    /// Initial state seeded with the configured speed and auto timings.
    pub fn from_config(config: &HmiConfig) -> Self {
        Self {
            speed: config.default_speed,
            auto_run_ms: config.default_auto_run_ms,
            auto_stop_ms: config.default_auto_stop_ms,
            ..Self::default()
        }
    }

    /// Applies every field of `update` in order.
    ///
    /// Fields absent from the update keep their value. Numeric fields whose
    /// value does not parse are skipped; the remaining fields still apply.
    pub fn apply(&mut self, update: &StatusUpdate) {
        for (key, value) in update.fields() {
            self.apply_field(key, value);
        }
    }

    fn apply_field(&mut self, key: StatusKey, value: &str) {
        match key {
            StatusKey::Mode => self.mode = Mode::from_wire(value),
            StatusKey::Run => self.running = parse_flag(value),
            StatusKey::Fault => self.fault = parse_flag(value),
            StatusKey::Relay => self.relay_engaged = parse_flag(value),
            StatusKey::AutoRun => self.auto_running = parse_flag(value),
            StatusKey::Speed => store_number(&mut self.speed, key, value),
            StatusKey::Steps => store_number(&mut self.steps, key, value),
            StatusKey::AutoRunMs => store_number(&mut self.auto_run_ms, key, value),
            StatusKey::AutoStopMs => store_number(&mut self.auto_stop_ms, key, value),
        }
    }

    /// Lamp states. Fault takes priority over the run/stop pair.
    pub fn indicators(&self) -> Indicators {
        if self.fault {
            Indicators {
                run: false,
                stop: false,
                fault: true,
                relay: self.relay_engaged,
            }
        } else {
            Indicators {
                run: self.running,
                stop: !self.running,
                fault: false,
                relay: self.relay_engaged,
            }
        }
    }
}

fn store_number<T>(slot: &mut T, key: StatusKey, value: &str)
where
    T: std::str::FromStr<Err = std::num::ParseIntError>,
{
    match parse_number::<T>(value) {
        Ok(parsed) => *slot = parsed,
        Err(e) => debug!("dropping malformed {key}={value:?}: {e}"),
    }
}
