//! Weight submissions: class averages and percentage normalization.
//!
//! Each submitter hands in one weight per indicator, optionally with GDP and
//! recession forecasts. The class model is the rounded mean of those weights.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use leadlab_core::domain::{IndicatorId, WeightMap};

use crate::forecasts::{summarize_forecasts, ClassForecasts, ForecastField};
use crate::stats::DistributionStats;

/// One submitter's weights and forecasts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSubmission {
    pub submitter: String,
    pub weights: WeightMap,
    #[serde(default)]
    pub forecasts: BTreeMap<ForecastField, f64>,
}

/// Spread of the submitted weights for one indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightSummary {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

/// Aggregated class weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassWeights {
    pub submitters: usize,
    /// Mean weight per indicator, rounded to the nearest integer.
    pub weights: WeightMap,
    pub summaries: BTreeMap<IndicatorId, WeightSummary>,
    pub forecasts: ClassForecasts,
}

/// Average every submitter's weights per indicator.
///
/// An indicator absent from a submission counts as 0 for that submitter.
/// Indicators nobody mentions are left out of the result.
pub fn aggregate_submissions(submissions: &[WeightSubmission]) -> ClassWeights {
    let ids: BTreeSet<IndicatorId> = submissions
        .iter()
        .flat_map(|s| s.weights.iter().map(|(id, _)| id))
        .collect();

    let mut weights = WeightMap::new();
    let mut summaries = BTreeMap::new();
    for id in ids {
        let column: Vec<f64> = submissions.iter().map(|s| s.weights.get(id)).collect();
        let stats = DistributionStats::from_values(&column);
        weights.set(id, stats.mean.round());
        summaries.insert(
            id,
            WeightSummary {
                avg: stats.mean,
                min: stats.min,
                max: stats.max,
            },
        );
    }

    let forecasts = summarize_forecasts(submissions);
    debug!(
        submitters = submissions.len(),
        indicators = weights.len(),
        forecasts = forecasts.summaries.len(),
        "aggregated weight submissions"
    );

    ClassWeights {
        submitters: submissions.len(),
        weights,
        summaries,
        forecasts,
    }
}

/// Rescale so the weights sum to roughly 100, each rounded to an integer.
///
/// A map whose weights sum to 0 is returned unchanged.
pub fn normalize_to_percent(weights: &WeightMap) -> WeightMap {
    let total = weights.total();
    if total == 0.0 {
        return weights.clone();
    }
    weights
        .iter()
        .map(|(id, w)| (id, (w / total * 100.0).round()))
        .collect()
}
