//! End-to-end backtest of one weighting: Builder → Generator → Classifier → Metrics.

use serde::{Deserialize, Serialize};

use crate::classify::{classify, Classified};
use crate::domain::{IndexPoint, IndicatorObservation, RecessionTable, Signal, WeightMap};
use crate::index::{CompositeIndexBuilder, Normalization};
use crate::metrics::{summarize, PerformanceReport};
use crate::signals::SignalRule;

/// Everything one backtest produces, in pipeline order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backtest {
    pub index: Vec<IndexPoint>,
    pub signals: Vec<Signal>,
    pub classified: Classified,
    pub report: PerformanceReport,
}

/// Run the four stages on in-memory inputs.
///
/// 1. Build the composite index from `observations` and `weights`
/// 2. Scan it for signals under `rule`
/// 3. Classify each signal against `recessions`
/// 4. Summarize into a `PerformanceReport`
pub fn run_backtest(
    observations: &[IndicatorObservation],
    weights: &WeightMap,
    normalization: Normalization,
    rule: &SignalRule,
    recessions: &RecessionTable,
) -> Backtest {
    let index = CompositeIndexBuilder::new(weights.clone(), normalization).build(observations);
    backtest_index(index, rule, recessions)
}

/// Stages 2–4 for an index that has already been built.
pub fn backtest_index(
    index: Vec<IndexPoint>,
    rule: &SignalRule,
    recessions: &RecessionTable,
) -> Backtest {
    let signals = rule.generate(&index, recessions);
    let classified = classify(&signals, recessions);
    let report = summarize(&classified.outcomes, &classified.missed_recessions, recessions);
    Backtest {
        index,
        signals,
        classified,
        report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IndicatorId, RecessionInterval};
    use crate::signals::ThresholdDirection;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn stages_compose() {
        let obs = vec![
            IndicatorObservation::new(d(2007, 1)).with(IndicatorId::Pmi, 1.0),
            IndicatorObservation::new(d(2007, 2)).with(IndicatorId::Pmi, -0.6),
            IndicatorObservation::new(d(2007, 3)).with(IndicatorId::Pmi, -0.7),
        ];
        let weights = WeightMap::new().with(IndicatorId::Pmi, 100.0);
        let table = RecessionTable::new(vec![RecessionInterval::new(d(2007, 12), d(2009, 6))]).unwrap();
        let rule = SignalRule::edge(-0.5, ThresholdDirection::Below);

        let bt = run_backtest(&obs, &weights, Normalization::PerDate, &rule, &table);

        assert_eq!(bt.index.len(), 3);
        assert_eq!(bt.signals.len(), 1);
        assert_eq!(bt.classified.outcomes.len(), 1);
        assert_eq!(bt.report.true_positives, 1);
        assert_eq!(bt.report.detection_rate_pct, 100.0);
    }
}
