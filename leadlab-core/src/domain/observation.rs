//! Per-date indicator observations and the composite index series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::indicator::IndicatorId;

/// Normalized (z-score) indicator values for a single period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorObservation {
    pub date: NaiveDate,
    pub values: BTreeMap<IndicatorId, f64>,
}

impl IndicatorObservation {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, id: IndicatorId, value: f64) -> Self {
        self.values.insert(id, value);
        self
    }

    /// Defined value for `id`.
    ///
    /// Returns `None` when the indicator is absent or holds NaN/infinity, so a
    /// garbled cell never propagates into the index.
    pub fn value(&self, id: IndicatorId) -> Option<f64> {
        self.values.get(&id).copied().filter(|v| v.is_finite())
    }
}

/// One point of the composite index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl IndexPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}
