//! Summary statistics for index series and weight columns.

use serde::{Deserialize, Serialize};

use leadlab_core::domain::IndexPoint;

/// Min / max / mean / median of a sample. All zeros for an empty sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

impl DistributionStats {
    /// Non-finite values are ignored.
    pub fn from_values(values: &[f64]) -> Self {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return Self::default();
        }
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };
        Self {
            min: sorted[0],
            max: sorted[n - 1],
            mean: sorted.iter().sum::<f64>() / n as f64,
            median,
        }
    }

    pub fn of_index(index: &[IndexPoint]) -> Self {
        let values: Vec<f64> = index.iter().map(|p| p.value).collect();
        Self::from_values(&values)
    }
}

/// Threshold used when a model does not set one: the index mean rounded to
/// one decimal. 0.0 for an empty index.
pub fn default_threshold(index: &[IndexPoint]) -> f64 {
    round_to(DistributionStats::of_index(index).mean, 1)
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}
