use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

use crate::analysis::{self, ErrorAnalysis};
use crate::config::{Preferences, TestDuration};
use crate::history::{text_preview, NewTestResult};
use crate::session::{Key, KeyOutcome, Session, Status};
use crate::store::Storage;
use crate::texts::{self, TextFilter};
use crate::timer::{Countdown, TimerEvent};

/// What a session left behind once it finished.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub analysis: ErrorAnalysis,
    pub saved: bool,
}

/// Wires the session, countdown and storage together.
///
/// Keys and clock polls come in; the trainer starts the countdown on the
/// first keystroke, feeds ticks to the session and, when the session ends,
/// analyses errors and stores exactly one result.
#[derive(Debug)]
pub struct Trainer {
    session: Session,
    countdown: Countdown,
    storage: Storage,
    preferences: Preferences,
    filter: TextFilter,
    session_id: Uuid,
    outcome: Option<Outcome>,
    rng: StdRng,
}

impl Trainer {
    pub fn new(storage: Storage, preferences: Preferences) -> Self {
        let filter = TextFilter {
            difficulty: preferences.difficulty,
            theme: preferences.topic.clone(),
        };
        let mut rng = StdRng::from_entropy();
        let text = texts::get_candidate_text(&filter, &mut rng);
        Self::build(storage, preferences, filter, text, rng)
    }

    /// Start on a caller supplied text instead of one from the corpus.
    pub fn with_text(storage: Storage, preferences: Preferences, text: impl Into<String>) -> Self {
        let filter = TextFilter {
            difficulty: preferences.difficulty,
            theme: preferences.topic.clone(),
        };
        Self::build(storage, preferences, filter, text.into(), StdRng::from_entropy())
    }

    fn build(
        storage: Storage,
        preferences: Preferences,
        filter: TextFilter,
        text: String,
        rng: StdRng,
    ) -> Self {
        Self {
            session: Session::new(text),
            countdown: Countdown::new(preferences.duration),
            storage,
            preferences,
            filter,
            session_id: Uuid::new_v4(),
            outcome: None,
            rng,
        }
    }

    pub fn handle_key(&mut self, key: Key, now: Instant) -> KeyOutcome {
        let was = self.session.status();
        let outcome = self.session.on_key(key, now);

        if was == Status::Idle && self.session.status() != Status::Idle {
            self.countdown.start(now);
            // prime the display with the full duration
            self.countdown.poll(now);
        }
        if was != Status::Finished && self.session.has_finished() {
            self.on_finished();
        }
        outcome
    }

    /// Advance the countdown; call this from the event loop's ticker.
    pub fn handle_tick(&mut self, now: Instant) {
        for event in self.countdown.poll(now) {
            match event {
                TimerEvent::Tick { remaining } => {
                    let elapsed = self.countdown.duration().secs().saturating_sub(remaining);
                    self.session.on_timer_tick(elapsed);
                }
                TimerEvent::Complete => {
                    if self.session.status() == Status::Running {
                        self.session.on_timer_complete();
                        self.on_finished();
                    }
                }
            }
        }
    }

    fn on_finished(&mut self) {
        self.countdown.stop();
        if self.outcome.is_some() {
            return;
        }

        let analysis = analysis::analyze(
            self.session.reference(),
            self.session.error_log(),
            &mut self.rng,
        );
        let saved = match self.session.summary() {
            Some(summary) => {
                let record = NewTestResult {
                    duration: self.countdown.duration().secs(),
                    wpm: summary.wpm,
                    accuracy: summary.accuracy,
                    errors_outstanding: self.session.errors_outstanding(),
                    errors_committed_total: self.session.errors_committed_total(),
                    text_length: self.session.reference().len(),
                    text_preview: text_preview(self.session.reference_text()),
                };
                let id = self.session_id.to_string();
                self.storage.save_test_result(record, Some(&id))
            }
            None => false,
        };

        if !saved {
            tracing::warn!(session = %self.session_id, "result was not persisted");
        }
        self.outcome = Some(Outcome { analysis, saved });
    }

    /// Fresh session on a newly chosen text.
    pub fn new_test(&mut self) {
        let text = texts::get_candidate_text(&self.filter, &mut self.rng);
        self.restart(text);
    }

    /// Fresh session on the same text.
    pub fn retry(&mut self) {
        let text = self.session.reference_text().to_string();
        self.restart(text);
    }

    pub fn restart(&mut self, text: impl Into<String>) {
        self.countdown.reset();
        self.session.restart(text);
        self.session_id = Uuid::new_v4();
        self.outcome = None;
        tracing::debug!(session = %self.session_id, "new session");
    }

    /// Only honoured before the first keystroke. Persists the choice.
    pub fn set_duration(&mut self, duration: TestDuration) -> bool {
        if self.session.status() != Status::Idle {
            return false;
        }
        self.countdown.set_duration(duration);
        self.preferences.duration = duration;
        self.preferences.save(&mut self.storage);
        true
    }

    pub fn cycle_duration(&mut self) -> bool {
        let all = TestDuration::ALL;
        let idx = all.iter().position(|d| *d == self.duration()).unwrap_or(0);
        self.set_duration(all[(idx + 1) % all.len()])
    }

    /// Record that the key help was shown once. Persists the choice.
    pub fn mark_tutorial_seen(&mut self) -> bool {
        self.preferences.tutorial_seen = true;
        self.preferences.save(&mut self.storage)
    }

    /// Cancel the countdown when the front end goes away.
    pub fn shutdown(&mut self) {
        self.countdown.stop();
    }

    pub fn is_typing(&self, now: Instant) -> bool {
        self.session.is_typing(now)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn duration(&self) -> TestDuration {
        self.countdown.duration()
    }

    pub fn remaining_secs(&self, now: Instant) -> u64 {
        self.countdown.remaining(now)
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }
}

impl Drop for Trainer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
