//! Edge-triggered scan: one signal per contiguous run past the threshold.

use crate::domain::{IndexPoint, Signal};

use super::ThresholdDirection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeState {
    Idle,
    Active,
}

/// Scan date-sorted `points` and emit a signal on every `Idle → Active` edge.
pub(crate) fn scan(points: &[IndexPoint], threshold: f64, direction: ThresholdDirection) -> Vec<Signal> {
    let mut state = EdgeState::Idle;
    let mut signals = Vec::new();

    for (i, point) in points.iter().enumerate() {
        let past = direction.meets_inclusive(point.value, threshold);
        state = match (state, past) {
            (EdgeState::Idle, true) => {
                signals.push(Signal {
                    date: point.date,
                    value: point.value,
                    source_index: i,
                });
                EdgeState::Active
            }
            (EdgeState::Active, true) => EdgeState::Active,
            (_, false) => EdgeState::Idle,
        };
    }
    signals
}
