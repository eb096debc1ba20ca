//! Stored test results: save with de-duplication, list, delete, summarise
//! and export.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Storage;

pub const HISTORY_KEY: &str = "history";
pub const MAX_HISTORY_ITEMS: usize = 100;
/// Two identical results closer together than this are the same save.
pub const DUPLICATE_WINDOW_MS: i64 = 2000;
const PREVIEW_CHARS: usize = 50;

/// A persisted, write-once record of one finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub duration: u64,
    pub wpm: f64,
    pub accuracy: f64,
    pub errors_outstanding: usize,
    pub errors_committed_total: usize,
    pub text_length: usize,
    pub text_preview: String,
}

/// Everything in a [`TestResult`] except what the store assigns.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTestResult {
    pub duration: u64,
    pub wpm: f64,
    pub accuracy: f64,
    pub errors_outstanding: usize,
    pub errors_committed_total: usize,
    pub text_length: usize,
    pub text_preview: String,
}

pub fn text_preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

impl NewTestResult {
    fn into_result(self, id: String, timestamp: DateTime<Utc>) -> TestResult {
        TestResult {
            id,
            timestamp,
            duration: self.duration,
            wpm: self.wpm,
            accuracy: self.accuracy,
            errors_outstanding: self.errors_outstanding,
            errors_committed_total: self.errors_committed_total,
            text_length: self.text_length,
            text_preview: self.text_preview,
        }
    }

    fn looks_like(&self, other: &TestResult) -> bool {
        self.wpm == other.wpm && self.accuracy == other.accuracy && self.duration == other.duration
    }
}

impl Storage {
    /// Most recent first.
    pub fn history(&self) -> Vec<TestResult> {
        self.get(HISTORY_KEY, Vec::new())
    }

    pub fn save_test_result(&mut self, result: NewTestResult, dedupe_key: Option<&str>) -> bool {
        self.save_test_result_at(result, dedupe_key, Utc::now())
    }

    pub fn save_test_result_at(
        &mut self,
        result: NewTestResult,
        dedupe_key: Option<&str>,
        now: DateTime<Utc>,
    ) -> bool {
        let mut history = self.history();

        if let Some(key) = dedupe_key {
            if history.iter().any(|item| item.id == key) {
                tracing::debug!(id = key, "result already saved");
                return true;
            }
        }

        let recent_duplicate = history.iter().any(|item| {
            (now - item.timestamp).num_milliseconds().abs() < DUPLICATE_WINDOW_MS
                && result.looks_like(item)
        });
        if recent_duplicate {
            tracing::debug!("identical result saved moments ago, skipping");
            return true;
        }

        let id = dedupe_key
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        history.insert(0, result.into_result(id, now));
        history.truncate(MAX_HISTORY_ITEMS);

        self.set(HISTORY_KEY, &history)
    }

    /// False when no result has this id.
    pub fn delete_result(&mut self, id: &str) -> bool {
        let history = self.history();
        let before = history.len();
        let remaining: Vec<TestResult> = history.into_iter().filter(|r| r.id != id).collect();

        if remaining.len() == before {
            return false;
        }
        self.set(HISTORY_KEY, &remaining)
    }

    pub fn clear_history(&mut self) -> bool {
        self.set(HISTORY_KEY, &Vec::<TestResult>::new())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HistoryStats {
    pub avg_wpm: f64,
    pub max_wpm: f64,
    pub avg_accuracy: f64,
    pub total_tests: usize,
    /// Mean WPM of the last five tests minus the five before; 0 under ten tests.
    pub recent_improvement: f64,
}

impl HistoryStats {
    pub fn from_history(history: &[TestResult]) -> Self {
        if history.is_empty() {
            return Self::default();
        }

        let n = history.len() as f64;
        let avg = |items: &[TestResult]| items.iter().map(|r| r.wpm).sum::<f64>() / items.len() as f64;

        let recent_improvement = if history.len() >= 10 {
            avg(&history[..5]) - avg(&history[5..10])
        } else {
            0.0
        };

        Self {
            avg_wpm: avg(history),
            max_wpm: history.iter().map(|r| r.wpm).fold(0.0, f64::max),
            avg_accuracy: history.iter().map(|r| r.accuracy).sum::<f64>() / n,
            total_tests: history.len(),
            recent_improvement,
        }
    }
}

pub fn export_csv<W: Write>(history: &[TestResult], writer: W) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for result in history {
        wtr.serialize(result)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_result(wpm: f64, accuracy: f64) -> NewTestResult {
        NewTestResult {
            duration: 60,
            wpm,
            accuracy,
            errors_outstanding: 1,
            errors_committed_total: 3,
            text_length: 120,
            text_preview: text_preview("The quick brown fox jumps over the lazy dog"),
        }
    }

    #[test]
    fn empty_history_by_default() {
        let storage = Storage::in_memory();
        assert!(storage.history().is_empty());
    }

    #[test]
    fn most_recent_first() {
        let mut storage = Storage::in_memory();
        let t0 = Utc::now();
        assert!(storage.save_test_result_at(new_result(40.0, 90.0), None, t0));
        assert!(storage.save_test_result_at(new_result(50.0, 95.0), None, t0 + Duration::seconds(10)));

        let wpms: Vec<f64> = storage.history().iter().map(|r| r.wpm).collect();
        assert_eq!(wpms, vec![50.0, 40.0]);
    }

    #[test]
    fn dedupe_key_prevents_second_record() {
        let mut storage = Storage::in_memory();
        let t0 = Utc::now();
        assert!(storage.save_test_result_at(new_result(40.0, 90.0), Some("session-1"), t0));
        assert!(storage.save_test_result_at(
            new_result(41.0, 91.0),
            Some("session-1"),
            t0 + Duration::seconds(30)
        ));

        let history = storage.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, "session-1");
        assert_eq!(history[0].wpm, 40.0);
    }

    #[test]
    fn identical_result_within_two_seconds_is_suppressed() {
        let mut storage = Storage::in_memory();
        let t0 = Utc::now();
        storage.save_test_result_at(new_result(40.0, 90.0), None, t0);
        storage.save_test_result_at(new_result(40.0, 90.0), None, t0 + Duration::milliseconds(1500));
        assert_eq!(storage.history().len(), 1);

        storage.save_test_result_at(new_result(40.0, 90.0), None, t0 + Duration::seconds(3));
        assert_eq!(storage.history().len(), 2);
    }

    #[test]
    fn history_is_capped() {
        let mut storage = Storage::in_memory();
        let t0 = Utc::now();
        for i in 0..(MAX_HISTORY_ITEMS + 5) {
            storage.save_test_result_at(
                new_result(i as f64, 100.0),
                None,
                t0 + Duration::seconds(i as i64 * 5),
            );
        }
        let history = storage.history();
        assert_eq!(history.len(), MAX_HISTORY_ITEMS);
        assert_eq!(history[0].wpm, (MAX_HISTORY_ITEMS + 4) as f64);
    }

    #[test]
    fn delete_and_clear() {
        let mut storage = Storage::in_memory();
        storage.save_test_result(new_result(40.0, 90.0), Some("a"));
        storage.save_test_result(new_result(60.0, 99.0), Some("b"));

        assert!(!storage.delete_result("missing"));
        assert!(storage.delete_result("a"));
        assert_eq!(storage.history().len(), 1);
        assert_eq!(storage.history()[0].id, "b");

        assert!(storage.clear_history());
        assert!(storage.history().is_empty());
    }

    #[test]
    fn preview_is_truncated_by_chars() {
        let text = "ñ".repeat(80);
        assert_eq!(text_preview(&text).chars().count(), 50);
        assert_eq!(text_preview("short"), "short");
    }

    #[test]
    fn stats_over_history() {
        let t0 = Utc::now();
        let history: Vec<TestResult> = (0..10)
            .map(|i| {
                // index 0 is most recent
                let wpm = if i < 5 { 60.0 } else { 50.0 };
                new_result(wpm, 90.0 + i as f64).into_result(i.to_string(), t0)
            })
            .collect();

        let stats = HistoryStats::from_history(&history);
        assert_eq!(stats.total_tests, 10);
        assert_eq!(stats.avg_wpm, 55.0);
        assert_eq!(stats.max_wpm, 60.0);
        assert_eq!(stats.avg_accuracy, 94.5);
        assert_eq!(stats.recent_improvement, 10.0);
    }

    #[test]
    fn stats_for_empty_history() {
        assert_eq!(HistoryStats::from_history(&[]), HistoryStats::default());
    }

    #[test]
    fn csv_export_has_header_and_rows() {
        let mut storage = Storage::in_memory();
        storage.save_test_result(new_result(42.5, 97.0), Some("abc"));

        let mut out = Vec::new();
        export_csv(&storage.history(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,timestamp,duration,wpm,accuracy,errors_outstanding,errors_committed_total,text_length,text_preview"
        );
        assert!(lines.next().unwrap().starts_with("abc,"));
    }
}
