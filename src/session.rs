use std::time::{Duration, Instant};

use crate::metrics;
use crate::results::{self, SessionSummary};
use crate::time_series::{PerformanceSample, PerformanceSeries};

/// No keystroke for this long and the typist counts as paused.
pub const TYPING_IDLE_AFTER: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Status {
    Idle,
    Running,
    Finished,
}

/// Keys as seen by the session, independent of the terminal backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Shift,
    Control,
    Alt,
    Meta,
    Tab,
    CapsLock,
    Escape,
    Other,
}

impl Key {
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            Key::Shift
                | Key::Control
                | Key::Alt
                | Key::Meta
                | Key::Tab
                | Key::CapsLock
                | Key::Escape
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    Typed { correct: bool },
    Erased,
}

/// An incorrect keystroke at a reference position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorEvent {
    pub position: usize,
    pub at: Instant,
}

/// One attempt at typing one reference text.
///
/// The session is the only thing that mutates typing state. Status moves
/// Idle -> Running -> Finished and never back; once finished every event is
/// a no-op and a fresh session is needed via [`Session::restart`].
#[derive(Debug, Clone)]
pub struct Session {
    reference_text: String,
    reference: Vec<char>,
    input: Vec<char>,
    status: Status,
    last_keystroke: Option<Instant>,
    elapsed_secs: u64,
    errors_outstanding: usize,
    errors_committed_total: usize,
    error_log: Vec<ErrorEvent>,
    samples: PerformanceSeries,
    wpm: f64,
    accuracy: f64,
    summary: Option<SessionSummary>,
}

impl Session {
    pub fn new(reference_text: impl Into<String>) -> Self {
        let reference_text = reference_text.into();
        let reference = reference_text.chars().collect();
        Self {
            reference_text,
            reference,
            input: Vec::new(),
            status: Status::Idle,
            last_keystroke: None,
            elapsed_secs: 0,
            errors_outstanding: 0,
            errors_committed_total: 0,
            error_log: Vec::new(),
            samples: PerformanceSeries::new(),
            wpm: 0.0,
            accuracy: 100.0,
            summary: None,
        }
    }

    /// Throw this attempt away and start over, Idle, on `new_text`.
    pub fn restart(&mut self, new_text: impl Into<String>) {
        *self = Session::new(new_text);
    }

    pub fn on_key(&mut self, key: Key, now: Instant) -> KeyOutcome {
        if self.status == Status::Finished || key.is_modifier() {
            return KeyOutcome::Ignored;
        }

        if self.status == Status::Idle {
            match key {
                // nothing to type against, so nothing to start
                Key::Char(_) if self.expected_char(self.cursor_position()).is_some() => {
                    self.start()
                }
                _ => return KeyOutcome::Ignored,
            }
        }

        match key {
            Key::Backspace => self.erase(now),
            Key::Char(c) => self.type_char(c, now),
            _ => KeyOutcome::Ignored,
        }
    }

    /// Record the elapsed time reported by the countdown and take a sample.
    pub fn on_timer_tick(&mut self, elapsed_secs: u64) {
        if self.status != Status::Running {
            return;
        }
        self.elapsed_secs = self.elapsed_secs.max(elapsed_secs);
        self.wpm = metrics::wpm(self);
        self.accuracy = metrics::accuracy(self);
        self.samples.record(PerformanceSample::new(
            self.elapsed_secs,
            self.wpm,
            self.accuracy,
        ));
    }

    pub fn on_timer_complete(&mut self) {
        self.finalize();
    }

    /// Running -> Finished. Returns false (and changes nothing) when the
    /// session was not running, so calling it twice is harmless.
    pub fn finalize(&mut self) -> bool {
        if self.status != Status::Running {
            return false;
        }

        self.wpm = metrics::wpm(self);
        self.accuracy = metrics::accuracy(self);
        self.samples.record(PerformanceSample::new(
            self.elapsed_secs,
            self.wpm,
            self.accuracy,
        ));
        self.status = Status::Finished;
        self.summary = Some(results::summarize(self));

        tracing::info!(
            wpm = self.wpm,
            accuracy = self.accuracy,
            elapsed_secs = self.elapsed_secs,
            errors_committed = self.errors_committed_total,
            "session finished"
        );
        true
    }

    fn start(&mut self) {
        self.status = Status::Running;
        self.samples.record(PerformanceSample::baseline());
        tracing::debug!(text_len = self.reference.len(), "session started");
    }

    fn erase(&mut self, now: Instant) -> KeyOutcome {
        if self.input.pop().is_none() {
            return KeyOutcome::Ignored;
        }
        self.last_keystroke = Some(now);
        self.refresh_errors();
        KeyOutcome::Erased
    }

    fn type_char(&mut self, c: char, now: Instant) -> KeyOutcome {
        let position = self.cursor_position();
        let Some(&expected) = self.reference.get(position) else {
            return KeyOutcome::Ignored;
        };

        self.input.push(c);
        self.last_keystroke = Some(now);

        let correct = c == expected;
        if !correct {
            self.errors_committed_total += 1;
            self.error_log.push(ErrorEvent { position, at: now });
        }
        self.refresh_errors();

        if self.cursor_position() == self.reference.len() {
            self.finalize();
        }

        KeyOutcome::Typed { correct }
    }

    fn refresh_errors(&mut self) {
        self.errors_outstanding = metrics::outstanding_errors(&self.reference, &self.input);
        self.accuracy = metrics::accuracy(self);
    }

    pub fn reference_text(&self) -> &str {
        &self.reference_text
    }

    pub fn reference(&self) -> &[char] {
        &self.reference
    }

    pub fn input(&self) -> &[char] {
        &self.input
    }

    pub fn input_text(&self) -> String {
        self.input.iter().collect()
    }

    pub fn cursor_position(&self) -> usize {
        self.input.len()
    }

    pub fn expected_char(&self, idx: usize) -> Option<char> {
        self.reference.get(idx).copied()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn has_started(&self) -> bool {
        self.status != Status::Idle
    }

    pub fn has_finished(&self) -> bool {
        self.status == Status::Finished
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn errors_outstanding(&self) -> usize {
        self.errors_outstanding
    }

    pub fn errors_committed_total(&self) -> usize {
        self.errors_committed_total
    }

    pub fn error_log(&self) -> &[ErrorEvent] {
        &self.error_log
    }

    pub fn samples(&self) -> &PerformanceSeries {
        &self.samples
    }

    /// WPM as of the last tick (or the final value once finished).
    pub fn wpm(&self) -> f64 {
        self.wpm
    }

    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub fn is_typing(&self, now: Instant) -> bool {
        self.status == Status::Running
            && self
                .last_keystroke
                .is_some_and(|last| now.saturating_duration_since(last) < TYPING_IDLE_AFTER)
    }
}
