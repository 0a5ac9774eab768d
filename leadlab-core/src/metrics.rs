//! Performance metrics: pure functions over classified signals.
//!
//! Everything here is computed from the classifier output and the recession
//! table. No dependency on how the index or signals were produced.

use serde::{Deserialize, Serialize};

use crate::classify::Classified;
use crate::domain::{Classification, RecessionInterval, RecessionTable, SignalOutcome};

/// Aggregate scores for one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub true_positives: usize,
    pub false_positives: usize,
    pub coincident_signals: usize,
    pub missed_recessions: usize,
    pub detected_recessions: usize,
    pub total_recessions: usize,
    pub avg_lead_time_months: f64,
    pub detection_rate_pct: f64,
    pub accuracy_pct: f64,
}

impl PerformanceReport {
    pub fn from_classified(classified: &Classified, recessions: &RecessionTable) -> Self {
        summarize(&classified.outcomes, &classified.missed_recessions, recessions)
    }

    pub fn signal_count(&self) -> usize {
        self.true_positives + self.false_positives + self.coincident_signals
    }
}

/// Score classified outcomes against the recession table.
pub fn summarize(
    outcomes: &[SignalOutcome],
    missed: &[RecessionInterval],
    recessions: &RecessionTable,
) -> PerformanceReport {
    let true_positives = count(outcomes, Classification::TruePositive);
    let false_positives = count(outcomes, Classification::FalsePositive);
    let coincident_signals = count(outcomes, Classification::Coincident);

    let total_recessions = recessions.len();
    let missed_recessions = missed.len();
    let detected_recessions = total_recessions.saturating_sub(missed_recessions);

    PerformanceReport {
        true_positives,
        false_positives,
        coincident_signals,
        missed_recessions,
        detected_recessions,
        total_recessions,
        avg_lead_time_months: avg_lead_time(outcomes),
        detection_rate_pct: detection_rate(detected_recessions, total_recessions),
        accuracy_pct: accuracy(
            true_positives,
            false_positives,
            missed_recessions,
            coincident_signals,
        ),
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Mean lead time over true positives. 0.0 when there are none.
pub fn avg_lead_time(outcomes: &[SignalOutcome]) -> f64 {
    let leads: Vec<i64> = outcomes
        .iter()
        .filter(|o| o.is_true_positive())
        .filter_map(|o| o.lead_time_months)
        .collect();
    if leads.is_empty() {
        return 0.0;
    }
    leads.iter().sum::<i64>() as f64 / leads.len() as f64
}

/// Detected recessions as a percentage of all recessions. 0.0 for an empty table.
pub fn detection_rate(detected: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    detected as f64 / total as f64 * 100.0
}

/// `tp / max(1, tp + fp + missed - coincident) * 100`.
///
/// Coincident signals are subtracted from the denominator, so the result can
/// exceed 100% when they outnumber the other terms. The value is reported as
/// computed.
pub fn accuracy(tp: usize, fp: usize, missed: usize, coincident: usize) -> f64 {
    let denominator = tp as i64 + fp as i64 + missed as i64 - coincident as i64;
    tp as f64 / denominator.max(1) as f64 * 100.0
}

fn count(outcomes: &[SignalOutcome], class: Classification) -> usize {
    outcomes.iter().filter(|o| o.classification == class).count()
}
