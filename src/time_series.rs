/// One point of the live performance chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceSample {
    pub elapsed_secs: u64,
    pub wpm: f64,
    pub accuracy: f64,
}

impl PerformanceSample {
    pub fn new(elapsed_secs: u64, wpm: f64, accuracy: f64) -> Self {
        Self {
            elapsed_secs,
            wpm,
            accuracy,
        }
    }

    /// Anchor point recorded when a session starts.
    pub fn baseline() -> Self {
        Self::new(0, 0.0, 100.0)
    }

    pub fn is_well_formed(&self) -> bool {
        self.wpm.is_finite() && self.accuracy.is_finite()
    }
}

impl From<PerformanceSample> for (f64, f64) {
    fn from(p: PerformanceSample) -> Self {
        (p.elapsed_secs as f64, p.wpm)
    }
}

/// Samples kept sorted by `elapsed_secs` with at most one entry per second.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceSeries {
    samples: Vec<PerformanceSample>,
}

impl PerformanceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert in order; a sample for an already recorded second replaces it.
    pub fn record(&mut self, sample: PerformanceSample) {
        match self
            .samples
            .binary_search_by_key(&sample.elapsed_secs, |s| s.elapsed_secs)
        {
            Ok(idx) => self.samples[idx] = sample,
            Err(idx) => self.samples.insert(idx, sample),
        }
    }

    pub fn samples(&self) -> &[PerformanceSample] {
        &self.samples
    }

    pub fn last(&self) -> Option<&PerformanceSample> {
        self.samples.last()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// `(seconds, wpm)` pairs for charting.
    pub fn wpm_points(&self) -> Vec<(f64, f64)> {
        self.samples
            .iter()
            .filter(|s| s.is_well_formed())
            .map(|&s| s.into())
            .collect()
    }
}
