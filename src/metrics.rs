//! Pure WPM and accuracy calculations.
//!
//! Nothing here holds state: every value is derived from the characters typed
//! so far, the reference text and the two error counters kept by the session.

use crate::session::{Session, Status};

/// Characters per "word" in the WPM convention.
pub const CHARS_PER_WORD: f64 = 5.0;

/// Number of positions where `input` matches `reference`.
pub fn correct_chars(reference: &[char], input: &[char]) -> usize {
    reference
        .iter()
        .zip(input.iter())
        .filter(|(expected, typed)| expected == typed)
        .count()
}

/// Number of typed positions that currently mismatch the reference.
pub fn outstanding_errors(reference: &[char], input: &[char]) -> usize {
    input
        .iter()
        .enumerate()
        .filter(|&(idx, typed)| reference.get(idx) != Some(typed))
        .count()
}

pub fn words_per_minute(correct_chars: usize, elapsed_secs: u64) -> f64 {
    if elapsed_secs == 0 {
        return 0.0;
    }
    let words = correct_chars as f64 / CHARS_PER_WORD;
    words / (elapsed_secs as f64 / 60.0)
}

/// Accuracy that penalises every committed error, including corrected ones.
///
/// `considered = typed + committed - outstanding`, `correct = typed - outstanding`.
pub fn accuracy_percent(typed_len: usize, errors_committed: usize, errors_outstanding: usize) -> f64 {
    let outstanding = errors_outstanding.min(typed_len);
    let considered = (typed_len + errors_committed).saturating_sub(outstanding);
    if considered == 0 {
        return 100.0;
    }
    let correct = typed_len - outstanding;
    (100.0 * correct as f64 / considered as f64).clamp(0.0, 100.0)
}

/// Live WPM of a session; 0 unless it is running with some elapsed time.
pub fn wpm(session: &Session) -> f64 {
    if session.status() != Status::Running {
        return 0.0;
    }
    words_per_minute(
        correct_chars(session.reference(), session.input()),
        session.elapsed_secs(),
    )
}

pub fn accuracy(session: &Session) -> f64 {
    accuracy_percent(
        session.input().len(),
        session.errors_committed_total(),
        session.errors_outstanding(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn correct_chars_counts_matching_positions_only() {
        assert_eq!(correct_chars(&chars("hello"), &chars("hxllo")), 4);
        assert_eq!(correct_chars(&chars("hello"), &chars("")), 0);
        assert_eq!(correct_chars(&chars("hi"), &chars("hi")), 2);
    }

    #[test]
    fn outstanding_errors_rescans_whole_input() {
        assert_eq!(outstanding_errors(&chars("cat"), &chars("cxt")), 1);
        assert_eq!(outstanding_errors(&chars("cat"), &chars("c")), 0);
        assert_eq!(outstanding_errors(&chars("cat"), &chars("dog")), 3);
    }

    #[test]
    fn wpm_uses_correct_characters_over_minutes() {
        assert_eq!(words_per_minute(200, 15), 160.0);
        assert_eq!(words_per_minute(50, 60), 10.0);
    }

    #[test]
    fn wpm_guards_zero_elapsed() {
        assert_eq!(words_per_minute(100, 0), 0.0);
    }

    #[test]
    fn accuracy_degenerate_case_is_exactly_100() {
        assert_eq!(accuracy_percent(0, 0, 0), 100.0);
    }

    #[test]
    fn accuracy_counts_corrected_errors() {
        // "cat" typed with one corrected mistake
        assert_eq!(accuracy_percent(3, 1, 0), 75.0);
        // one uncorrected mistake out of two chars
        assert_eq!(accuracy_percent(2, 1, 1), 50.0);
    }

    #[test]
    fn accuracy_stays_within_bounds() {
        for typed in 0..8 {
            for committed in 0..8 {
                for outstanding in 0..=committed.min(typed) {
                    let acc = accuracy_percent(typed, committed, outstanding);
                    assert!((0.0..=100.0).contains(&acc), "{typed} {committed} {outstanding}");
                }
            }
        }
    }
}
