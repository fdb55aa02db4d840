use std::time::Duration;

use bevy::prelude::Resource;
use bevy::time::{Timer, TimerMode};

/// Fixed-cadence trigger for the `status` poll, advanced by the frame clock.
///
/// Ticks are unconditional: a poll fires whether or not the previous one
/// was answered.
#[derive(Resource)]
pub struct Poller {
    timer: Timer,
}

impl Poller {
    pub fn new(interval: Duration) -> Self {
        Self {
            timer: Timer::new(interval, TimerMode::Repeating),
        }
    }

    /// Advances the clock by `delta`; returns true when a poll is due.
    ///
    /// A delta spanning several periods still yields a single poll.
    pub fn tick(&mut self, delta: Duration) -> bool {
        self.timer.tick(delta).just_finished()
    }

    pub fn interval(&self) -> Duration {
        self.timer.duration()
    }
}
