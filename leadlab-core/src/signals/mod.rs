//! Signal generation: threshold crossings of the composite index.
//!
//! Two suppression policies are supported and selected per run:
//! - [`CooldownPolicy::EdgeTriggered`]: one signal per contiguous run past the
//!   threshold (inclusive comparison).
//! - [`CooldownPolicy::Gated`]: every point strictly past the threshold is a
//!   candidate, and a cooldown gate decides which candidates are emitted.
//!
//! Generators sort their input themselves; callers may pass the index in any
//! order. Output is strictly increasing in date.

pub mod cooldown;
pub mod edge;

pub use cooldown::{CooldownGate, CooldownState, RecessionRelease, DEFAULT_MIN_GAP_DAYS};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{IndexPoint, RecessionTable, Signal};

/// Which side of the threshold raises the alarm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdDirection {
    /// Alarm when the index falls to or below the threshold.
    #[default]
    Below,
    /// Alarm when the index rises to or above the threshold.
    Above,
}

impl ThresholdDirection {
    /// `<=` / `>=` comparison used by the edge-triggered policy.
    pub fn meets_inclusive(self, value: f64, threshold: f64) -> bool {
        match self {
            ThresholdDirection::Below => value <= threshold,
            ThresholdDirection::Above => value >= threshold,
        }
    }

    /// `<` / `>` comparison used by the gated policy.
    pub fn meets_strict(self, value: f64, threshold: f64) -> bool {
        match self {
            ThresholdDirection::Below => value < threshold,
            ThresholdDirection::Above => value > threshold,
        }
    }
}

/// Suppression policy applied after a threshold crossing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CooldownPolicy {
    #[default]
    EdgeTriggered,
    Gated(CooldownGate),
}

impl CooldownPolicy {
    /// 730-day cooldown, also released by a recession ending after the last signal.
    pub fn standard_gate() -> Self {
        CooldownPolicy::Gated(CooldownGate::default())
    }

    pub fn name(&self) -> &'static str {
        match self {
            CooldownPolicy::EdgeTriggered => "edge_triggered",
            CooldownPolicy::Gated(_) => "gated",
        }
    }
}

/// Threshold, direction and suppression policy for one analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalRule {
    pub threshold: f64,
    pub direction: ThresholdDirection,
    #[serde(default)]
    pub cooldown: CooldownPolicy,
}

impl SignalRule {
    pub fn new(threshold: f64, direction: ThresholdDirection, cooldown: CooldownPolicy) -> Self {
        Self {
            threshold,
            direction,
            cooldown,
        }
    }

    pub fn edge(threshold: f64, direction: ThresholdDirection) -> Self {
        Self::new(threshold, direction, CooldownPolicy::EdgeTriggered)
    }

    /// Scan `index` and emit signals.
    ///
    /// `recessions` is only consulted by the gated policy (recession exits
    /// release the cooldown).
    pub fn generate(&self, index: &[IndexPoint], recessions: &RecessionTable) -> Vec<Signal> {
        let points = chronological(index);
        let signals = match self.cooldown {
            CooldownPolicy::EdgeTriggered => {
                edge::scan(&points, self.threshold, self.direction)
            }
            CooldownPolicy::Gated(gate) => {
                cooldown::scan(&points, self.threshold, self.direction, &gate, recessions)
            }
        };
        debug!(
            points = points.len(),
            signals = signals.len(),
            policy = self.cooldown.name(),
            threshold = self.threshold,
            "generated signals"
        );
        signals
    }
}

/// Generate signals in one call.
pub fn generate(
    index: &[IndexPoint],
    threshold: f64,
    direction: ThresholdDirection,
    cooldown: CooldownPolicy,
    recessions: &RecessionTable,
) -> Vec<Signal> {
    SignalRule::new(threshold, direction, cooldown).generate(index, recessions)
}

/// Stable sort by date, keeping the first point of any repeated date.
fn chronological(index: &[IndexPoint]) -> Vec<IndexPoint> {
    let mut points = index.to_vec();
    points.sort_by_key(|p| p.date);
    points.dedup_by_key(|p| p.date);
    points
}
