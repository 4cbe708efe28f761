use serde::Deserialize;

/// Tuning knobs for the matching engine and the batch orchestrator.
///
/// The thresholds are empirical; the defaults are the values that satisfy the
/// worked examples in the matching tests (exact name + publisher with no
/// version evidence scores 0.90).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchingConfig {
    pub high_threshold: Option<f64>,
    pub low_threshold: Option<f64>,
    pub name_weight: Option<f64>,
    pub publisher_weight: Option<f64>,
    pub version_bonus: Option<f64>,
    pub max_alternates: Option<usize>,
    pub wave_size: Option<usize>,
    pub failure_threshold: Option<usize>,
}

impl MatchingConfig {
    /// Confidence at or above this classifies as "matched" (inclusive).
    pub fn high_threshold(&self) -> f64 {
        self.high_threshold.unwrap_or(0.85)
    }

    /// Confidence below this (or zero candidates) classifies as "unmatched".
    pub fn low_threshold(&self) -> f64 {
        self.low_threshold.unwrap_or(0.45)
    }

    pub fn name_weight(&self) -> f64 {
        self.name_weight.unwrap_or(0.62)
    }

    pub fn publisher_weight(&self) -> f64 {
        self.publisher_weight.unwrap_or(0.28)
    }

    pub fn version_bonus(&self) -> f64 {
        self.version_bonus.unwrap_or(0.10)
    }

    pub fn max_alternates(&self) -> usize {
        self.max_alternates.unwrap_or(5)
    }

    /// Concurrent catalog lookups per batch-matching wave.
    pub fn wave_size(&self) -> usize {
        self.wave_size.unwrap_or(8)
    }

    /// A matching run flips the project to "error" once this many per-app
    /// failures accumulate in a single run.
    pub fn failure_threshold(&self) -> usize {
        self.failure_threshold.unwrap_or(25)
    }
}
