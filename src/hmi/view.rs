use std::collections::VecDeque;

use chrono::{DateTime, Local};
use log::debug;

use crate::device::DeviceState;
use crate::session::PresentationSink;

/// One timestamped line of the operator log.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub at: DateTime<Local>,
    pub text: String,
}

impl LogEntry {
    /// `HH:MM:SS.mmm text`
    pub fn display(&self) -> String {
        format!("{} {}", self.at.format("%H:%M:%S%.3f"), self.text)
    }
}

/// What the panel renders: the latest snapshot and a bounded log.
pub struct HmiView {
    state: DeviceState,
    log: VecDeque<LogEntry>,
    max_lines: usize,
}

impl HmiView {
    pub fn new(max_lines: usize) -> Self {
        Self {
            state: DeviceState::default(),
            log: VecDeque::with_capacity(max_lines.min(1024)),
            max_lines: max_lines.max(1),
        }
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn log(&self) -> impl Iterator<Item = &LogEntry> {
        self.log.iter()
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }
}

impl PresentationSink for HmiView {
    fn on_state_changed(&mut self, state: &DeviceState) {
        self.state.clone_from(state);
    }

    fn on_log_line(&mut self, line: &str) {
        debug!("[hmi] {line}");
        if self.log.len() == self.max_lines {
            self.log.pop_front();
        }
        self.log.push_back(LogEntry {
            at: Local::now(),
            text: line.to_owned(),
        });
    }
}
