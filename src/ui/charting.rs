/// Lowest WPM ceiling for the results chart, so a slow run still has a y range.
const MIN_WPM_BOUND: f64 = 10.0;

/// Compute X (seconds) and Y (WPM) bounds for the results chart
pub fn compute_chart_params(wpm_coords: &[(f64, f64)], test_secs: f64) -> (f64, f64) {
    let highest_wpm = wpm_coords
        .iter()
        .map(|&(_, wpm)| wpm)
        .fold(0.0, f64::max)
        .max(MIN_WPM_BOUND);

    let overall_duration = match wpm_coords.last() {
        Some(&(t, _)) if t >= 1.0 => t,
        Some(_) => 1.0,
        None => test_secs.max(1.0),
    };

    (overall_duration, highest_wpm.ceil())
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_series_uses_test_length() {
        let (x, y) = compute_chart_params(&[], 30.0);
        assert_eq!(x, 30.0);
        assert_eq!(y, MIN_WPM_BOUND);
    }

    #[test]
    fn bounds_follow_samples() {
        let (x, y) = compute_chart_params(&[(0.0, 0.0), (1.0, 42.3), (5.0, 38.0)], 60.0);
        assert_eq!(x, 5.0);
        assert_eq!(y, 43.0);
    }

    #[test]
    fn only_baseline_sample() {
        let (x, _) = compute_chart_params(&[(0.0, 0.0)], 60.0);
        assert_eq!(x, 1.0);
    }

    #[test]
    fn labels() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(1.2345), "1.23");
    }
}
