//! Recession classifier: scores each signal against the recession table.
//!
//! A signal inside a recession window is coincident and carries no predictive
//! value. Otherwise it is matched to the next recession start; it counts as a
//! true positive when that start is at most [`LEAD_HORIZON_MONTHS`] away.
//!
//! A recession is detected only through a true positive matched to its start.
//! Coincident signals never detect anything.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Classification, RecessionInterval, RecessionTable, Signal, SignalOutcome};

/// Longest lead time, in months, that still counts as a usable warning.
pub const LEAD_HORIZON_MONTHS: i64 = 24;

/// Lead times are measured in 30-day months.
pub const DAYS_PER_MONTH: f64 = 30.0;

/// Months between `signal_date` and `recession_start`, rounded to the nearest month.
pub fn lead_time_months(signal_date: NaiveDate, recession_start: NaiveDate) -> i64 {
    let days = (recession_start - signal_date).num_days() as f64;
    (days / DAYS_PER_MONTH).round() as i64
}

/// Classified signals plus the recessions no signal detected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classified {
    pub outcomes: Vec<SignalOutcome>,
    pub missed_recessions: Vec<RecessionInterval>,
}

impl Classified {
    pub fn true_positives(&self) -> impl Iterator<Item = &SignalOutcome> {
        self.outcomes.iter().filter(|o| o.is_true_positive())
    }

    /// Missed recessions that nonetheless received a coincident signal.
    ///
    /// These were flagged only after they had begun.
    pub fn late_detections(&self) -> Vec<RecessionInterval> {
        let flagged: BTreeSet<NaiveDate> = self
            .outcomes
            .iter()
            .filter(|o| o.is_coincident())
            .filter_map(|o| o.matched_recession_start)
            .collect();
        self.missed_recessions
            .iter()
            .filter(|r| flagged.contains(&r.start))
            .copied()
            .collect()
    }
}

/// Classify a single signal.
pub fn classify_signal(signal: &Signal, recessions: &RecessionTable) -> SignalOutcome {
    if let Some(current) = recessions.containing(signal.date) {
        return SignalOutcome {
            signal: *signal,
            classification: Classification::Coincident,
            lead_time_months: Some(0),
            matched_recession_start: Some(current.start),
        };
    }

    let Some(next) = recessions.next_after(signal.date) else {
        return SignalOutcome {
            signal: *signal,
            classification: Classification::FalsePositive,
            lead_time_months: None,
            matched_recession_start: None,
        };
    };

    let lead = lead_time_months(signal.date, next.start);
    let classification = if lead <= LEAD_HORIZON_MONTHS {
        Classification::TruePositive
    } else {
        Classification::FalsePositive
    };
    SignalOutcome {
        signal: *signal,
        classification,
        lead_time_months: Some(lead),
        matched_recession_start: Some(next.start),
    }
}

/// Classify every signal and collect the recessions left undetected.
pub fn classify(signals: &[Signal], recessions: &RecessionTable) -> Classified {
    let outcomes: Vec<SignalOutcome> = signals
        .iter()
        .map(|s| classify_signal(s, recessions))
        .collect();

    let detected: BTreeSet<NaiveDate> = outcomes
        .iter()
        .filter(|o| o.is_true_positive())
        .filter_map(|o| o.matched_recession_start)
        .collect();

    let missed_recessions: Vec<RecessionInterval> = recessions
        .iter()
        .filter(|r| !detected.contains(&r.start))
        .copied()
        .collect();

    debug!(
        signals = outcomes.len(),
        detected = detected.len(),
        missed = missed_recessions.len(),
        "classified signals"
    );

    Classified {
        outcomes,
        missed_recessions,
    }
}
