use std::time::Instant;

use keystride::{
    config::{Preferences, TestDuration},
    history::{export_csv, HistoryStats, NewTestResult},
    session::Key,
    store::Storage,
    texts::Difficulty,
    trainer::Trainer,
};
use tempfile::TempDir;

fn finish(trainer: &mut Trainer, text: &str) {
    let now = Instant::now();
    for c in text.chars() {
        trainer.handle_key(Key::Char(c), now);
    }
}

#[test]
fn results_survive_reopening_the_database() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("nested").join("keystride.db");

    let storage = Storage::open(&db);
    assert!(storage.is_persistent());
    let mut trainer = Trainer::with_text(storage, Preferences::default(), "dog");
    finish(&mut trainer, "dog");
    let id = trainer.session_id().to_string();

    trainer.retry();
    finish(&mut trainer, "dig");
    drop(trainer);

    let reopened = Storage::open(&db);
    let history = reopened.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].id, id);
    assert_eq!(history[1].accuracy, 100.0);
    assert_eq!(history[0].errors_outstanding, 1);
    assert_eq!(history[0].text_preview, "dog");
}

#[test]
fn preferences_persist_between_runs() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("keystride.db");

    {
        let mut storage = Storage::open(&db);
        let mut prefs = Preferences::load(&storage);
        prefs.difficulty = Some(Difficulty::Advanced);
        prefs.topic = Some("science".into());
        assert!(prefs.save(&mut storage));

        let mut trainer = Trainer::with_text(storage, prefs, "x");
        assert!(trainer.set_duration(TestDuration::Thirty));
    }

    let prefs = Preferences::load(&Storage::open(&db));
    assert_eq!(prefs.duration, TestDuration::Thirty);
    assert_eq!(prefs.difficulty, Some(Difficulty::Advanced));
    assert_eq!(prefs.topic.as_deref(), Some("science"));
    assert!(prefs.last_used.is_some());
}

#[test]
fn unusable_database_path_degrades_to_memory() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, "not a directory").unwrap();

    let mut storage = Storage::open(blocker.join("keystride.db"));
    assert!(!storage.is_persistent());

    let saved = storage.save_test_result(
        NewTestResult {
            duration: 30,
            wpm: 50.0,
            accuracy: 98.0,
            errors_outstanding: 0,
            errors_committed_total: 1,
            text_length: 10,
            text_preview: "0123456789".into(),
        },
        None,
    );
    assert!(saved);
    assert_eq!(storage.history().len(), 1);
}

#[test]
fn corrupt_history_reads_as_empty() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("keystride.db");

    let mut storage = Storage::open(&db);
    assert!(storage.set_raw("history", "{ not json"));

    assert!(storage.history().is_empty());
    assert_eq!(HistoryStats::from_history(&storage.history()).total_tests, 0);
}

#[test]
fn export_round_trips_through_csv() {
    let mut storage = Storage::in_memory();
    let mut trainer = Trainer::with_text(Storage::in_memory(), Preferences::default(), "ok, go");
    finish(&mut trainer, "ok, go");
    let result = trainer.storage().history().remove(0);
    storage.save_test_result(
        NewTestResult {
            duration: result.duration,
            wpm: result.wpm,
            accuracy: result.accuracy,
            errors_outstanding: result.errors_outstanding,
            errors_committed_total: result.errors_committed_total,
            text_length: result.text_length,
            text_preview: result.text_preview.clone(),
        },
        Some(&result.id),
    );

    let mut out = Vec::new();
    export_csv(&storage.history(), &mut out).unwrap();

    let mut reader = csv::Reader::from_reader(out.as_slice());
    let rows: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][0], result.id.as_str());
    assert_eq!(&rows[0][8], "ok, go");
}
