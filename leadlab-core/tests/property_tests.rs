//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. Index date coverage: one point per distinct observation date, sorted
//! 2. Signal ordering: strictly increasing dates under every policy
//! 3. Classification totality: every signal gets exactly one class
//! 4. Determinism: identical inputs give identical outputs
//! 5. Detection monotonicity: a true positive for a missed recession detects it

use chrono::{Months, NaiveDate};
use proptest::prelude::*;

use leadlab_core::classify::classify;
use leadlab_core::domain::{
    IndexPoint, IndicatorId, IndicatorObservation, RecessionInterval, RecessionTable, Signal,
    WeightMap,
};
use leadlab_core::index::{build, Normalization};
use leadlab_core::metrics::summarize;
use leadlab_core::pipeline::backtest_index;
use leadlab_core::signals::{CooldownGate, CooldownPolicy, SignalRule, ThresholdDirection};

// ── Strategies (proptest) ────────────────────────────────────────────

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()
}

fn month(offset: u32) -> NaiveDate {
    base() + Months::new(offset)
}

fn arb_value() -> impl Strategy<Value = f64> {
    (-3.0..3.0_f64).prop_map(|v| (v * 100.0).round() / 100.0)
}

/// Monthly index with one point per month.
fn arb_index() -> impl Strategy<Value = Vec<IndexPoint>> {
    prop::collection::vec(arb_value(), 0..120).prop_map(|values| {
        values
            .into_iter()
            .enumerate()
            .map(|(i, v)| IndexPoint::new(month(i as u32), v))
            .collect()
    })
}

/// Observations with a random subset of indicators present each month.
fn arb_observations() -> impl Strategy<Value = Vec<IndicatorObservation>> {
    prop::collection::vec(
        prop::collection::vec(prop::option::of(arb_value()), IndicatorId::ALL.len()),
        0..60,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, cells)| {
                let mut obs = IndicatorObservation::new(month(i as u32));
                for (id, cell) in IndicatorId::ALL.into_iter().zip(cells) {
                    if let Some(v) = cell {
                        obs = obs.with(id, v);
                    }
                }
                obs
            })
            .collect()
    })
}

fn arb_weights() -> impl Strategy<Value = WeightMap> {
    prop::collection::vec(0.0..100.0_f64, IndicatorId::ALL.len()).prop_map(|ws| {
        IndicatorId::ALL.into_iter().zip(ws).collect()
    })
}

/// Non-overlapping recessions separated by at least two months.
fn arb_recessions() -> impl Strategy<Value = RecessionTable> {
    prop::collection::vec((2u32..30, 0u32..18), 0..5).prop_map(|spans| {
        let mut cursor = 0u32;
        let mut intervals = Vec::new();
        for (gap, len) in spans {
            let start = cursor + gap;
            let end = start + len;
            intervals.push(RecessionInterval::new(month(start), month(end)));
            cursor = end;
        }
        RecessionTable::new(intervals).unwrap()
    })
}

fn arb_policy() -> impl Strategy<Value = CooldownPolicy> {
    prop_oneof![
        Just(CooldownPolicy::EdgeTriggered),
        Just(CooldownPolicy::standard_gate()),
        (30i64..1000).prop_map(|days| CooldownPolicy::Gated(CooldownGate::elapsed_only(days))),
        Just(CooldownPolicy::Gated(CooldownGate::recession_only())),
    ]
}

fn arb_direction() -> impl Strategy<Value = ThresholdDirection> {
    prop_oneof![Just(ThresholdDirection::Below), Just(ThresholdDirection::Above)]
}

fn arb_normalization() -> impl Strategy<Value = Normalization> {
    prop_oneof![Just(Normalization::PerDate), Just(Normalization::Global)]
}

// ── 1. Index Date Coverage ───────────────────────────────────────────

proptest! {
    /// One finite index point per observation date, in date order.
    #[test]
    fn index_covers_every_observation_date(
        obs in arb_observations(),
        weights in arb_weights(),
        norm in arb_normalization(),
    ) {
        let index = build(&obs, &weights, norm);
        prop_assert_eq!(index.len(), obs.len());
        for (point, o) in index.iter().zip(&obs) {
            prop_assert_eq!(point.date, o.date);
            prop_assert!(point.value.is_finite());
        }
    }
}

// ── 2. Signal Ordering ───────────────────────────────────────────────

proptest! {
    /// Signal dates strictly increase, whatever the policy.
    #[test]
    fn signals_strictly_increase(
        index in arb_index(),
        threshold in -1.5..1.5_f64,
        direction in arb_direction(),
        policy in arb_policy(),
        table in arb_recessions(),
    ) {
        let rule = SignalRule::new(threshold, direction, policy);
        let signals = rule.generate(&index, &table);
        for pair in signals.windows(2) {
            prop_assert!(pair[0].date < pair[1].date);
        }
    }

    /// Shuffling the index does not change the signals.
    #[test]
    fn signals_ignore_input_order(
        index in arb_index(),
        threshold in -1.5..1.5_f64,
        policy in arb_policy(),
        table in arb_recessions(),
    ) {
        let rule = SignalRule::new(threshold, ThresholdDirection::Below, policy);
        let mut reversed = index.clone();
        reversed.reverse();
        prop_assert_eq!(rule.generate(&index, &table), rule.generate(&reversed, &table));
    }
}

// ── 3. Classification Totality ───────────────────────────────────────

proptest! {
    /// tp + fp + coincident == signals, and detected + missed == total.
    #[test]
    fn every_signal_is_classified_once(
        index in arb_index(),
        threshold in -1.5..1.5_f64,
        policy in arb_policy(),
        table in arb_recessions(),
    ) {
        let rule = SignalRule::new(threshold, ThresholdDirection::Below, policy);
        let bt = backtest_index(index, &rule, &table);
        let r = &bt.report;
        prop_assert_eq!(r.true_positives + r.false_positives + r.coincident_signals, bt.signals.len());
        prop_assert_eq!(r.detected_recessions + r.missed_recessions, r.total_recessions);
        prop_assert!(r.detection_rate_pct >= 0.0 && r.detection_rate_pct <= 100.0);
        prop_assert!(r.accuracy_pct >= 0.0);
    }
}

// ── 4. Determinism ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn pipeline_is_deterministic(
        index in arb_index(),
        threshold in -1.5..1.5_f64,
        policy in arb_policy(),
        table in arb_recessions(),
    ) {
        let rule = SignalRule::new(threshold, ThresholdDirection::Below, policy);
        let a = backtest_index(index.clone(), &rule, &table);
        let b = backtest_index(index, &rule, &table);
        prop_assert_eq!(a, b);
    }
}

// ── 5. Detection Monotonicity ────────────────────────────────────────

proptest! {
    /// A signal one month before a missed recession detects exactly that one.
    #[test]
    fn true_positive_for_missed_recession_detects_it(
        index in arb_index(),
        threshold in -1.5..1.5_f64,
        table in arb_recessions(),
    ) {
        let rule = SignalRule::edge(threshold, ThresholdDirection::Below);
        let signals = rule.generate(&index, &table);
        let before = classify(&signals, &table);
        let Some(target) = before.missed_recessions.first().copied() else {
            return Ok(());
        };

        let mut extended = signals.clone();
        extended.push(Signal {
            date: target.start - Months::new(1),
            value: threshold - 1.0,
            source_index: index.len(),
        });
        let after = classify(&extended, &table);

        let r_before = summarize(&before.outcomes, &before.missed_recessions, &table);
        let r_after = summarize(&after.outcomes, &after.missed_recessions, &table);
        prop_assert_eq!(r_after.missed_recessions + 1, r_before.missed_recessions);
        prop_assert_eq!(r_after.detected_recessions, r_before.detected_recessions + 1);
        prop_assert!(!after.missed_recessions.contains(&target));
    }
}
