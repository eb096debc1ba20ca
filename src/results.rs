//! End-of-session aggregation: consistency, character counts and the
//! headline numbers shown on the results screen.

use crate::metrics;
use crate::session::Session;
use crate::time_series::PerformanceSample;
use crate::util::RunningStats;

/// Score used when there are too few samples to judge steadiness.
pub const NEUTRAL_CONSISTENCY: u8 = 50;
const MIN_CONSISTENCY_SAMPLES: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharacterStats {
    /// Length of the reference text
    pub total: usize,
    pub correct: usize,
    /// Every incorrect keystroke, corrected or not
    pub error: usize,
    pub fixed: usize,
    pub unfixed: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub wpm: f64,
    pub accuracy: f64,
    pub consistency: u8,
    pub peak_wpm: f64,
    pub average_wpm: f64,
    pub elapsed_secs: u64,
    pub char_stats: CharacterStats,
}

pub fn summarize(session: &Session) -> SessionSummary {
    let samples = session.samples().samples();
    let wpm = session.wpm();

    SessionSummary {
        wpm,
        accuracy: session.accuracy(),
        consistency: consistency(samples),
        peak_wpm: peak_wpm(samples),
        average_wpm: average_wpm(samples, wpm),
        elapsed_secs: session.elapsed_secs(),
        char_stats: character_stats(session),
    }
}

/// 0..=100 score from the coefficient of variation of per-sample WPM.
///
/// Only finite samples with positive WPM count. `cv = 0` maps to 100 and
/// `cv >= 0.5` to 0.
pub fn consistency(samples: &[PerformanceSample]) -> u8 {
    let stats: RunningStats = samples
        .iter()
        .filter(|s| s.is_well_formed() && s.wpm > 0.0)
        .map(|s| s.wpm)
        .collect();

    if stats.count() < MIN_CONSISTENCY_SAMPLES {
        return NEUTRAL_CONSISTENCY;
    }

    match (stats.mean(), stats.std_dev()) {
        (Some(mean), Some(std_dev)) if mean > 0.0 => {
            let cv = std_dev / mean;
            (100.0 - 200.0 * cv).round().clamp(0.0, 100.0) as u8
        }
        _ => NEUTRAL_CONSISTENCY,
    }
}

pub fn peak_wpm(samples: &[PerformanceSample]) -> f64 {
    samples
        .iter()
        .filter(|s| s.is_well_formed())
        .map(|s| s.wpm)
        .fold(0.0, f64::max)
}

/// Time-weighted mean WPM using the trapezoid between consecutive samples.
pub fn average_wpm(samples: &[PerformanceSample], final_wpm: f64) -> f64 {
    let valid: Vec<&PerformanceSample> = samples.iter().filter(|s| s.is_well_formed()).collect();

    let (weighted, total_secs) = valid
        .windows(2)
        .map(|pair| {
            let interval = pair[1].elapsed_secs.saturating_sub(pair[0].elapsed_secs) as f64;
            ((pair[0].wpm + pair[1].wpm) / 2.0 * interval, interval)
        })
        .fold((0.0, 0.0), |(w, t), (dw, dt)| (w + dw, t + dt));

    if total_secs > 0.0 {
        weighted / total_secs
    } else {
        final_wpm
    }
}

pub fn character_stats(session: &Session) -> CharacterStats {
    let committed = session.errors_committed_total();
    let outstanding = session.errors_outstanding();

    CharacterStats {
        total: session.reference().len(),
        correct: metrics::correct_chars(session.reference(), session.input()),
        error: committed,
        fixed: committed.saturating_sub(outstanding),
        unfixed: outstanding,
    }
}
