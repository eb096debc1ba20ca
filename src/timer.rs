use std::time::{Duration, Instant};

use crate::config::TestDuration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum TimerState {
    Stopped,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Whole seconds left, emitted at most once per distinct value.
    Tick { remaining: u64 },
    Complete,
}

/// Wall-clock countdown.
///
/// Remaining time is always recomputed from the end instant, so a stalled
/// event loop never makes the countdown drift. The owner calls [`Countdown::poll`]
/// from whatever recurring callback it has.
#[derive(Debug, Clone)]
pub struct Countdown {
    duration: TestDuration,
    state: TimerState,
    ends_at: Option<Instant>,
    last_reported: Option<u64>,
}

impl Countdown {
    pub fn new(duration: TestDuration) -> Self {
        Self {
            duration,
            state: TimerState::Stopped,
            ends_at: None,
            last_reported: None,
        }
    }

    pub fn duration(&self) -> TestDuration {
        self.duration
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    /// Starting an already running countdown keeps the original end instant.
    pub fn start(&mut self, now: Instant) {
        if self.is_running() {
            return;
        }
        self.ends_at = Some(now + Duration::from_secs(self.duration.secs()));
        self.last_reported = None;
        self.state = TimerState::Running;
        tracing::debug!(secs = self.duration.secs(), "countdown started");
    }

    pub fn stop(&mut self) {
        self.state = TimerState::Stopped;
    }

    /// Changing the duration always resets, whether running or not.
    pub fn set_duration(&mut self, duration: TestDuration) {
        self.duration = duration;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.state = TimerState::Stopped;
        self.ends_at = None;
        self.last_reported = None;
    }

    /// Seconds left, rounded up. Full duration before start.
    pub fn remaining(&self, now: Instant) -> u64 {
        match self.ends_at {
            Some(end) => {
                let left = end.saturating_duration_since(now);
                let secs = left.as_secs();
                if left.subsec_nanos() > 0 {
                    secs + 1
                } else {
                    secs
                }
            }
            None => self.duration.secs(),
        }
    }

    pub fn elapsed(&self, now: Instant) -> u64 {
        self.duration.secs().saturating_sub(self.remaining(now))
    }

    /// One iteration of the scheduling loop.
    pub fn poll(&mut self, now: Instant) -> Vec<TimerEvent> {
        if !self.is_running() {
            return vec![];
        }

        let remaining = self.remaining(now);
        let mut events = Vec::with_capacity(2);
        if self.last_reported != Some(remaining) {
            self.last_reported = Some(remaining);
            events.push(TimerEvent::Tick { remaining });
        }
        if remaining == 0 {
            self.stop();
            events.push(TimerEvent::Complete);
        }
        events
    }
}
