use std::time::{Duration, Instant};

use assert_matches::assert_matches;
use keystride::{
    config::{Preferences, TestDuration},
    metrics,
    results::{self, NEUTRAL_CONSISTENCY},
    session::{Key, KeyOutcome, Session, Status},
    store::Storage,
    time_series::PerformanceSample,
    trainer::Trainer,
};

fn trainer(text: &str, duration: TestDuration) -> Trainer {
    let prefs = Preferences {
        duration,
        ..Preferences::default()
    };
    Trainer::with_text(Storage::in_memory(), prefs, text)
}

fn assert_invariants(session: &Session) {
    assert!(session.errors_outstanding() <= session.input().len());
    assert!(session.input().len() <= session.reference().len());
    assert!(session.errors_committed_total() >= session.errors_outstanding());
    let samples = session.samples().samples();
    assert!(samples.windows(2).all(|w| w[0].elapsed_secs < w[1].elapsed_secs));
    assert!((0.0..=100.0).contains(&session.accuracy()));
}

#[test]
fn clean_run_finishes_on_last_keystroke() {
    let t0 = Instant::now();
    let mut trainer = trainer("cat", TestDuration::Sixty);

    trainer.handle_key(Key::Char('c'), t0);
    assert_eq!(trainer.session().status(), Status::Running);
    trainer.handle_key(Key::Char('a'), t0);
    trainer.handle_key(Key::Char('t'), t0);

    let session = trainer.session();
    assert_eq!(session.status(), Status::Finished);
    assert_eq!(session.errors_committed_total(), 0);
    assert_eq!(session.accuracy(), 100.0);
    assert_eq!(session.cursor_position(), 3);
    assert_invariants(session);
}

#[test]
fn corrected_typo_costs_accuracy() {
    let t0 = Instant::now();
    let mut trainer = trainer("cat", TestDuration::Sixty);

    for key in [
        Key::Char('c'),
        Key::Char('x'),
        Key::Backspace,
        Key::Char('a'),
        Key::Char('t'),
    ] {
        trainer.handle_key(key, t0);
        assert_invariants(trainer.session());
    }

    let session = trainer.session();
    assert_eq!(session.status(), Status::Finished);
    assert_eq!(session.errors_committed_total(), 1);
    assert_eq!(session.errors_outstanding(), 0);
    assert_eq!(session.input_text(), "cat");
    assert_eq!(session.accuracy(), 75.0);
    assert_eq!(trainer.storage().history()[0].accuracy, 75.0);
}

#[test]
fn untouched_session_never_starts_or_saves() {
    let t0 = Instant::now();
    let mut trainer = trainer("cat", TestDuration::Fifteen);

    // modifiers and backspace alone do not start anything
    trainer.handle_key(Key::Shift, t0);
    trainer.handle_key(Key::Backspace, t0);

    for secs in 1..=30 {
        trainer.handle_tick(t0 + Duration::from_secs(secs));
        assert_eq!(trainer.session().status(), Status::Idle);
    }

    assert!(!trainer.countdown().is_running());
    assert!(trainer.outcome().is_none());
    assert!(trainer.storage().history().is_empty());
}

#[test]
fn wpm_of_two_hundred_chars_in_fifteen_seconds() {
    let text = "abcd ".repeat(40);
    assert_eq!(text.chars().count(), 200);

    let t0 = Instant::now();
    let mut session = Session::new(text.clone());
    let chars: Vec<char> = text.chars().collect();
    for (i, &c) in chars[..199].iter().enumerate() {
        session.on_key(Key::Char(c), t0 + Duration::from_millis(75 * i as u64));
        session.on_timer_tick((75 * i as u64) / 1000);
    }
    session.on_timer_tick(15);
    assert_eq!(metrics::wpm(&session), (199.0 / 5.0) / (15.0 / 60.0));

    session.on_key(Key::Char(chars[199]), t0 + Duration::from_secs(15));

    assert_eq!(session.status(), Status::Finished);
    assert_eq!(session.wpm(), 160.0);
    assert_eq!(session.summary().unwrap().wpm, 160.0);
    assert_invariants(&session);
}

#[test]
fn finalize_is_idempotent() {
    let t0 = Instant::now();
    let mut trainer = trainer("cats", TestDuration::Fifteen);
    trainer.handle_key(Key::Char('c'), t0);

    // completion from the clock, then keys and more clock
    trainer.handle_tick(t0 + Duration::from_secs(15));
    let samples = trainer.session().samples().len();
    assert_matches!(trainer.handle_key(Key::Char('a'), t0), KeyOutcome::Ignored);
    trainer.handle_tick(t0 + Duration::from_secs(16));

    assert_eq!(trainer.session().samples().len(), samples);
    assert_eq!(trainer.storage().history().len(), 1);
}

#[test]
fn backspace_correction_law() {
    let t0 = Instant::now();
    let mut session = Session::new("hello world");
    for c in "hell".chars() {
        session.on_key(Key::Char(c), t0);
    }
    let outstanding = session.errors_outstanding();
    let committed = session.errors_committed_total();

    assert_matches!(
        session.on_key(Key::Char('x'), t0),
        KeyOutcome::Typed { correct: false }
    );
    assert_matches!(session.on_key(Key::Backspace, t0), KeyOutcome::Erased);

    assert_eq!(session.errors_outstanding(), outstanding);
    assert_eq!(session.errors_committed_total(), committed + 1);
}

#[test]
fn consistency_bounds() {
    let steady: Vec<PerformanceSample> = (1..=5)
        .map(|s| PerformanceSample::new(s, 60.0, 100.0))
        .collect();
    assert_eq!(results::consistency(&steady), 100);

    let few = [PerformanceSample::new(1, 40.0, 100.0), PerformanceSample::new(2, 80.0, 100.0)];
    assert_eq!(results::consistency(&few), NEUTRAL_CONSISTENCY);

    let wild: Vec<PerformanceSample> = [5.0, 200.0, 1.0, 150.0]
        .iter()
        .enumerate()
        .map(|(i, &wpm)| PerformanceSample::new(i as u64 + 1, wpm, 100.0))
        .collect();
    assert_eq!(results::consistency(&wild), 0);
}

#[test]
fn accuracy_with_nothing_typed_is_perfect() {
    assert_eq!(metrics::accuracy_percent(0, 0, 0), 100.0);
    assert_eq!(metrics::accuracy(&Session::new("abc")), 100.0);
}
