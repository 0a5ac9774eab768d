//! Composite index builder: weighted aggregation of indicator z-scores.
//!
//! Each observation date produces exactly one index point, even when no
//! indicator contributes (the value is then 0). Downstream stages rely on the
//! index covering every input date.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{IndexPoint, IndicatorId, IndicatorObservation, WeightMap};

/// How the weighted sum is scaled back to z-score units.
///
/// The two conventions disagree whenever an indicator with nonzero weight is
/// missing on some date. A run uses exactly one of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Divide by the weights of the indicators that actually contributed on
    /// that date (nonzero weight and a defined value).
    #[default]
    PerDate,
    /// Divide by the sum of every weight in the map, once for the whole run.
    /// Missing values contribute 0 but keep their weight in the denominator.
    Global,
}

/// Builds an index series from a weight map under a fixed normalization.
#[derive(Debug, Clone)]
pub struct CompositeIndexBuilder {
    weights: WeightMap,
    normalization: Normalization,
}

impl CompositeIndexBuilder {
    pub fn new(weights: WeightMap, normalization: Normalization) -> Self {
        Self {
            weights,
            normalization,
        }
    }

    pub fn weights(&self) -> &WeightMap {
        &self.weights
    }

    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    /// Build the index for `observations`.
    ///
    /// Output is sorted by date. If two observations share a date, the first
    /// one in input order wins. Empty input yields an empty series.
    pub fn build(&self, observations: &[IndicatorObservation]) -> Vec<IndexPoint> {
        let mut ordered: Vec<&IndicatorObservation> = observations.iter().collect();
        ordered.sort_by_key(|o| o.date);

        let global_total = self.weights.total();
        let mut seen = BTreeSet::new();
        let mut points = Vec::with_capacity(ordered.len());

        for obs in ordered {
            if !seen.insert(obs.date) {
                warn!(date = %obs.date, "duplicate observation date, keeping first");
                continue;
            }
            let value = match self.normalization {
                Normalization::PerDate => self.per_date_value(obs),
                Normalization::Global => self.global_value(obs, global_total),
            };
            points.push(IndexPoint::new(obs.date, value));
        }

        debug!(
            points = points.len(),
            normalization = ?self.normalization,
            "built composite index"
        );
        points
    }

    fn per_date_value(&self, obs: &IndicatorObservation) -> f64 {
        let mut weighted_sum = 0.0;
        let mut active_weight = 0.0;
        for (id, weight) in self.weights.iter() {
            if weight == 0.0 || !weight.is_finite() {
                continue;
            }
            let Some(raw) = obs.value(id) else {
                continue;
            };
            weighted_sum += adjusted(id, raw) * weight;
            active_weight += weight;
        }
        if active_weight == 0.0 {
            0.0
        } else {
            weighted_sum / active_weight
        }
    }

    fn global_value(&self, obs: &IndicatorObservation, total: f64) -> f64 {
        if total == 0.0 {
            return 0.0;
        }
        let weighted_sum: f64 = self
            .weights
            .iter()
            .filter(|(_, w)| w.is_finite())
            .map(|(id, w)| obs.value(id).map_or(0.0, |raw| adjusted(id, raw)) * w)
            .sum();
        weighted_sum / total
    }
}

/// Build an index series in one call.
pub fn build(
    observations: &[IndicatorObservation],
    weights: &WeightMap,
    normalization: Normalization,
) -> Vec<IndexPoint> {
    CompositeIndexBuilder::new(weights.clone(), normalization).build(observations)
}

/// Orient a raw value so that lower always means "worse".
fn adjusted(id: IndicatorId, raw: f64) -> f64 {
    if id.is_inverted() {
        -raw
    } else {
        raw
    }
}
