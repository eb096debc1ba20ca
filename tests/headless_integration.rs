use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use keystride::{
    config::{Preferences, TestDuration},
    runtime::{ChannelEventSource, FixedTicker, Runner, TrainerEvent},
    session::{Key, Status},
    store::Storage,
    trainer::Trainer,
};

fn key(c: char) -> TrainerEvent {
    TrainerEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

// Headless run of the event loop: runner events feed the trainer without a TTY.
#[test]
fn headless_typing_flow_completes() {
    let mut trainer = Trainer::with_text(Storage::in_memory(), Preferences::default(), "hi");

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        ChannelEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );

    tx.send(key('h')).unwrap();
    tx.send(TrainerEvent::Key(KeyEvent::new(
        KeyCode::Char('x'),
        KeyModifiers::CONTROL,
    )))
    .unwrap();
    tx.send(key('i')).unwrap();

    for _ in 0..100u32 {
        let now = Instant::now();
        match runner.step() {
            TrainerEvent::Tick => trainer.handle_tick(now),
            TrainerEvent::Resize => {}
            TrainerEvent::Key(event) => {
                trainer.handle_key(Key::from(event), now);
                if trainer.session().has_finished() {
                    break;
                }
            }
        }
    }

    assert!(trainer.session().has_finished());
    assert_eq!(trainer.session().input_text(), "hi");
    assert_eq!(trainer.session().accuracy(), 100.0);
    assert_eq!(trainer.storage().history().len(), 1);
}

#[test]
fn headless_backspace_flow() {
    let mut trainer = Trainer::with_text(Storage::in_memory(), Preferences::default(), "ab");

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        ChannelEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );

    // backspace before the first char does nothing
    for event in [
        TrainerEvent::Key(KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE)),
        key('x'),
        TrainerEvent::Key(KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE)),
        key('a'),
        key('b'),
    ] {
        tx.send(event).unwrap();
    }
    drop(tx);

    while !trainer.session().has_finished() {
        match runner.step() {
            TrainerEvent::Key(event) => {
                trainer.handle_key(Key::from(event), Instant::now());
            }
            _ => break,
        }
    }

    let session = trainer.session();
    assert_eq!(session.status(), Status::Finished);
    assert_eq!(session.errors_committed_total(), 1);
    assert_eq!(session.errors_outstanding(), 0);
}

#[test]
fn headless_timed_session_finishes_by_time() {
    let mut prefs = Preferences::default();
    prefs.duration = TestDuration::Fifteen;
    let mut trainer = Trainer::with_text(Storage::in_memory(), prefs, "hello world");

    let t0 = Instant::now();
    trainer.handle_key(Key::Char('h'), t0);
    trainer.handle_key(Key::Char('e'), t0);

    // a simulated clock, polled at the runner's 100ms pace
    let mut now = t0;
    for _ in 0..200 {
        now += Duration::from_millis(100);
        trainer.handle_tick(now);
        if trainer.session().has_finished() {
            break;
        }
    }

    let session = trainer.session();
    assert!(session.has_finished());
    assert_eq!(session.elapsed_secs(), 15);
    assert!(!trainer.countdown().is_running());

    let samples = session.samples().samples();
    assert!(samples.windows(2).all(|w| w[0].elapsed_secs < w[1].elapsed_secs));
    assert_eq!(samples.last().unwrap().elapsed_secs, 15);
    assert_eq!(trainer.storage().history().len(), 1);
}
