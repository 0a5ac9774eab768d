//! Signal events and their classification against recession windows.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An alarm emitted where the index crossed the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub date: NaiveDate,
    /// Index value at the signal date.
    pub value: f64,
    /// Position of the triggering point in the date-sorted index series.
    pub source_index: usize,
}

/// Outcome of scoring a single signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Fired inside a recession window. Not predictive.
    Coincident,
    /// Preceded a recession start by at most the lead horizon.
    TruePositive,
    /// No recession followed, or the next one was too far away.
    FalsePositive,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Classification::Coincident => "Coincident",
            Classification::TruePositive => "True Positive",
            Classification::FalsePositive => "False Positive",
        };
        f.pad(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalOutcome {
    pub signal: Signal,
    pub classification: Classification,
    /// Months from signal to matched recession start. `Some(0)` for coincident
    /// signals, `None` when no later recession exists. Recorded for false
    /// positives beyond the horizon too.
    pub lead_time_months: Option<i64>,
    pub matched_recession_start: Option<NaiveDate>,
}

impl SignalOutcome {
    pub fn is_true_positive(&self) -> bool {
        self.classification == Classification::TruePositive
    }

    pub fn is_false_positive(&self) -> bool {
        self.classification == Classification::FalsePositive
    }

    pub fn is_coincident(&self) -> bool {
        self.classification == Classification::Coincident
    }
}
