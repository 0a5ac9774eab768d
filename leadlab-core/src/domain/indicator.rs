//! Indicator vocabulary and weights.
//!
//! The engine works on a closed set of leading indicators. String headers from
//! upstream spreadsheets are mapped onto `IndicatorId` at the ingestion boundary;
//! nothing inside the engine matches on names.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One of the eight leading indicators the composite index is built from.
///
/// Variant order is the canonical column order used for display and hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorId {
    /// Treasury yield curve spread (10Y minus 2Y).
    #[serde(rename = "yield_curve_10y2y")]
    YieldCurve10y2y,
    IsmNewOrders,
    BuildingPermits,
    ConsumerConfidence,
    Pmi,
    /// 4-week moving average of initial unemployment claims.
    InitialClaims,
    /// Composite leading indicator proxy.
    Cli,
    #[serde(rename = "sp500")]
    Sp500,
}

impl IndicatorId {
    pub const ALL: [IndicatorId; 8] = [
        IndicatorId::YieldCurve10y2y,
        IndicatorId::IsmNewOrders,
        IndicatorId::BuildingPermits,
        IndicatorId::ConsumerConfidence,
        IndicatorId::Pmi,
        IndicatorId::InitialClaims,
        IndicatorId::Cli,
        IndicatorId::Sp500,
    ];

    /// Canonical snake_case identifier (matches the serde name).
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorId::YieldCurve10y2y => "yield_curve_10y2y",
            IndicatorId::IsmNewOrders => "ism_new_orders",
            IndicatorId::BuildingPermits => "building_permits",
            IndicatorId::ConsumerConfidence => "consumer_confidence",
            IndicatorId::Pmi => "pmi",
            IndicatorId::InitialClaims => "initial_claims",
            IndicatorId::Cli => "cli",
            IndicatorId::Sp500 => "sp500",
        }
    }

    /// Column code used by the z-score source tables.
    pub fn source_code(&self) -> &'static str {
        match self {
            IndicatorId::YieldCurve10y2y => "10Y2Y_Yield",
            IndicatorId::IsmNewOrders => "ISM_Orders",
            IndicatorId::BuildingPermits => "Building_Permits",
            IndicatorId::ConsumerConfidence => "Consumer_Confidence",
            IndicatorId::Pmi => "PMI",
            IndicatorId::InitialClaims => "Initial_Claims",
            IndicatorId::Cli => "CLI",
            IndicatorId::Sp500 => "SP500",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IndicatorId::YieldCurve10y2y => "Yield Curve (10Y-2Y)",
            IndicatorId::IsmNewOrders => "ISM New Orders",
            IndicatorId::BuildingPermits => "Building Permits",
            IndicatorId::ConsumerConfidence => "Consumer Confidence",
            IndicatorId::Pmi => "Manufacturing PMI",
            IndicatorId::InitialClaims => "Initial Claims",
            IndicatorId::Cli => "CLI",
            IndicatorId::Sp500 => "S&P 500",
        }
    }

    /// True when a rising raw value signals deterioration.
    ///
    /// Claims are stored with the same orientation as the other series, so the
    /// builder flips their sign before weighting.
    pub fn is_inverted(&self) -> bool {
        matches!(self, IndicatorId::InitialClaims)
    }

    /// Exact lookup by canonical id or source column code.
    ///
    /// Surrounding whitespace is ignored; anything else must match exactly.
    pub fn from_name(name: &str) -> Option<IndicatorId> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == name || id.source_code() == name)
    }
}

impl fmt::Display for IndicatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An indicator together with its user-assigned weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    pub id: IndicatorId,
    pub label: String,
    pub weight: f64,
}

impl Indicator {
    pub fn new(id: IndicatorId, weight: f64) -> Self {
        Self {
            id,
            label: id.label().to_string(),
            weight,
        }
    }
}

/// Percentage-like weight per indicator.
///
/// Weights are not required to sum to 100. `BTreeMap` keeps iteration order
/// deterministic, which the index builder and run fingerprints rely on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightMap(BTreeMap<IndicatorId, f64>);

impl WeightMap {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn set(&mut self, id: IndicatorId, weight: f64) {
        self.0.insert(id, weight);
    }

    pub fn with(mut self, id: IndicatorId, weight: f64) -> Self {
        self.set(id, weight);
        self
    }

    /// Weight for `id`, or 0 when unset.
    pub fn get(&self, id: IndicatorId) -> f64 {
        self.0.get(&id).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (IndicatorId, f64)> + '_ {
        self.0.iter().map(|(id, w)| (*id, *w))
    }

    /// Sum of all finite weights.
    pub fn total(&self) -> f64 {
        self.0.values().filter(|w| w.is_finite()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Indicator records for every entry, in canonical order.
    pub fn indicators(&self) -> Vec<Indicator> {
        self.iter().map(|(id, w)| Indicator::new(id, w)).collect()
    }
}

impl FromIterator<(IndicatorId, f64)> for WeightMap {
    fn from_iter<T: IntoIterator<Item = (IndicatorId, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
