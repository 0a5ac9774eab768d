//! Cooldown-gated scan.
//!
//! Every point strictly past the threshold is a candidate. A candidate becomes a
//! signal only when the gate is open: no signal yet, or the minimum gap has
//! elapsed since the last one, or a recession releases it. How a recession
//! releases the gate is chosen by [`RecessionRelease`].
//!
//! The gate memory is a plain value (`CooldownState`) folded through the scan.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{IndexPoint, RecessionTable, Signal};

use super::ThresholdDirection;

/// 24 months, in days.
pub const DEFAULT_MIN_GAP_DAYS: i64 = 730;

/// Release conditions for a suppressed candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownGate {
    /// Days that must pass after a signal before the gap releases the gate.
    pub min_gap_days: i64,
    /// Release once `min_gap_days` have elapsed.
    pub release_after_gap: bool,
    /// Let recessions release the gate, as selected by `recession_release`.
    pub release_after_recession: bool,
    pub recession_release: RecessionRelease,
}

/// Recession condition that reopens the gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecessionRelease {
    /// Open once the scan has stepped out of a recession that ended strictly
    /// after the last signal.
    #[default]
    ExitAfterSignal,
    /// Stay closed only while the last signal is strictly after the latest
    /// recession that ended before the candidate. Until some recession has
    /// ended, every candidate passes.
    LatestEnd,
}

impl Default for CooldownGate {
    fn default() -> Self {
        Self {
            min_gap_days: DEFAULT_MIN_GAP_DAYS,
            release_after_gap: true,
            release_after_recession: true,
            recession_release: RecessionRelease::ExitAfterSignal,
        }
    }
}

impl CooldownGate {
    /// Gap-only release.
    pub fn elapsed_only(min_gap_days: i64) -> Self {
        Self {
            min_gap_days,
            release_after_gap: true,
            release_after_recession: false,
            recession_release: RecessionRelease::ExitAfterSignal,
        }
    }

    /// Recession-only release: re-arms whenever the last signal is no later
    /// than the most recent completed recession.
    pub fn recession_only() -> Self {
        Self {
            release_after_gap: false,
            release_after_recession: true,
            recession_release: RecessionRelease::LatestEnd,
            ..Self::default()
        }
    }

    /// A gate with neither release condition only ever lets the first signal through.
    pub fn has_release(&self) -> bool {
        self.release_after_gap || self.release_after_recession
    }
}

/// Gate memory carried from one point to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownState {
    pub last_signal_date: Option<NaiveDate>,
    /// End of the most recent recession the series has exited.
    pub last_recession_end: Option<NaiveDate>,
}

impl CooldownState {
    /// Record a recession exit between two consecutive points.
    ///
    /// If `prev` lies inside an interval and `cur` does not lie inside that same
    /// interval, the interval's end becomes `last_recession_end`.
    pub fn observe_step(self, prev: NaiveDate, cur: NaiveDate, recessions: &RecessionTable) -> Self {
        match recessions.containing(prev) {
            Some(r) if !r.contains(cur) => Self {
                last_recession_end: Some(r.end),
                ..self
            },
            _ => self,
        }
    }

    /// Whether a candidate on `date` may be emitted.
    pub fn permits(&self, date: NaiveDate, gate: &CooldownGate, recessions: &RecessionTable) -> bool {
        let Some(last) = self.last_signal_date else {
            return true;
        };
        let gap_elapsed =
            gate.release_after_gap && (date - last).num_days() >= gate.min_gap_days;
        let recession_reset = gate.release_after_recession
            && match gate.recession_release {
                RecessionRelease::ExitAfterSignal => {
                    self.last_recession_end.is_some_and(|end| end > last)
                }
                RecessionRelease::LatestEnd => recessions
                    .last_ended_before(date)
                    .map_or(true, |r| last <= r.end),
            };
        gap_elapsed || recession_reset
    }

    pub fn record_signal(self, date: NaiveDate) -> Self {
        Self {
            last_signal_date: Some(date),
            ..self
        }
    }
}

/// Result of folding one point through the gate.
struct Step {
    state: CooldownState,
    signal: Option<Signal>,
}

#[allow(clippy::too_many_arguments)]
fn step(
    state: CooldownState,
    prev: Option<&IndexPoint>,
    point: &IndexPoint,
    index: usize,
    threshold: f64,
    direction: ThresholdDirection,
    gate: &CooldownGate,
    recessions: &RecessionTable,
) -> Step {
    let state = match prev {
        Some(p) => state.observe_step(p.date, point.date, recessions),
        None => state,
    };

    if !direction.meets_strict(point.value, threshold) || !state.permits(point.date, gate, recessions) {
        return Step {
            state,
            signal: None,
        };
    }

    Step {
        state: state.record_signal(point.date),
        signal: Some(Signal {
            date: point.date,
            value: point.value,
            source_index: index,
        }),
    }
}

/// Scan date-sorted `points` through the cooldown gate.
pub(crate) fn scan(
    points: &[IndexPoint],
    threshold: f64,
    direction: ThresholdDirection,
    gate: &CooldownGate,
    recessions: &RecessionTable,
) -> Vec<Signal> {
    let (_, signals) = points.iter().enumerate().fold(
        (CooldownState::default(), Vec::new()),
        |(state, mut signals), (i, point)| {
            let prev = i.checked_sub(1).map(|j| &points[j]);
            let out = step(state, prev, point, i, threshold, direction, gate, recessions);
            signals.extend(out.signal);
            (out.state, signals)
        },
    );
    signals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecessionInterval;
    use chrono::Months;

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    /// Monthly series starting at `start`.
    fn monthly(start: NaiveDate, values: &[f64]) -> Vec<IndexPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| IndexPoint::new(start.checked_add_months(Months::new(i as u32)).unwrap(), *v))
            .collect()
    }

    fn dates(signals: &[Signal]) -> Vec<NaiveDate> {
        signals.iter().map(|s| s.date).collect()
    }

    #[test]
    fn second_candidate_within_gap_is_suppressed() {
        // Candidates at 2000-01 and 2000-04, no recession in between.
        let pts = monthly(d(2000, 1), &[-1.0, 0.0, 0.0, -1.0, 0.0]);
        let s = scan(&pts, -0.5, ThresholdDirection::Below, &CooldownGate::default(), &RecessionTable::empty());
        assert_eq!(dates(&s), vec![d(2000, 1)]);
    }

    #[test]
    fn sustained_level_refires_after_gap() {
        // 30 consecutive months below threshold.
        let pts = monthly(d(2000, 1), &[-1.0; 30]);
        let s = scan(&pts, -0.5, ThresholdDirection::Below, &CooldownGate::default(), &RecessionTable::empty());
        // 2000-01-01 + 730 days = 2001-12-31, so the first month on or after is 2002-01.
        assert_eq!(dates(&s), vec![d(2000, 1), d(2002, 1)]);
    }

    #[test]
    fn equal_to_threshold_is_not_a_candidate() {
        let pts = monthly(d(2000, 1), &[-0.5, -0.5]);
        let s = scan(&pts, -0.5, ThresholdDirection::Below, &CooldownGate::default(), &RecessionTable::empty());
        assert!(s.is_empty());
    }

    #[test]
    fn recession_exit_after_last_signal_releases_gate() {
        // Signal 2000-01, recession 2000-03..2000-05, exit observed at 2000-06.
        let table = RecessionTable::new(vec![RecessionInterval::new(d(2000, 3), d(2000, 5))]).unwrap();
        let pts = monthly(d(2000, 1), &[-1.0, 0.0, 0.0, 0.0, 0.0, 0.0, -1.0]);
        let s = scan(&pts, -0.5, ThresholdDirection::Below, &CooldownGate::default(), &table);
        assert_eq!(dates(&s), vec![d(2000, 1), d(2000, 7)]);
    }

    #[test]
    fn recession_exit_is_ignored_when_recession_release_disabled() {
        let table = RecessionTable::new(vec![RecessionInterval::new(d(2000, 3), d(2000, 5))]).unwrap();
        let pts = monthly(d(2000, 1), &[-1.0, 0.0, 0.0, 0.0, 0.0, 0.0, -1.0]);
        let gate = CooldownGate::elapsed_only(DEFAULT_MIN_GAP_DAYS);
        let s = scan(&pts, -0.5, ThresholdDirection::Below, &gate, &table);
        assert_eq!(dates(&s), vec![d(2000, 1)]);
    }

    #[test]
    fn exit_release_without_gap_never_releases_on_time() {
        let gate = CooldownGate {
            release_after_gap: false,
            ..CooldownGate::default()
        };
        let pts = monthly(d(2000, 1), &[-1.0; 40]);
        let s = scan(&pts, -0.5, ThresholdDirection::Below, &gate, &RecessionTable::empty());
        assert_eq!(dates(&s), vec![d(2000, 1)]);
    }

    #[test]
    fn recession_only_fires_freely_until_a_recession_ends() {
        let pts = monthly(d(2000, 1), &[-1.0; 4]);
        let s = scan(&pts, -0.5, ThresholdDirection::Below, &CooldownGate::recession_only(), &RecessionTable::empty());
        assert_eq!(dates(&s), vec![d(2000, 1), d(2000, 2), d(2000, 3), d(2000, 4)]);
    }

    #[test]
    fn recession_only_holds_once_signal_follows_latest_end() {
        // Recession 2000-03..2000-05. 2000-02 passes (nothing has ended yet),
        // 2000-07 passes (last signal 2000-02 is before the 2000-05 end),
        // 2000-08 is held (last signal 2000-07 is after it).
        let table = RecessionTable::new(vec![RecessionInterval::new(d(2000, 3), d(2000, 5))]).unwrap();
        let pts = monthly(d(2000, 1), &[-1.0, -1.0, 0.0, 0.0, 0.0, 0.0, -1.0, -1.0]);
        let s = scan(&pts, -0.5, ThresholdDirection::Below, &CooldownGate::recession_only(), &table);
        assert_eq!(dates(&s), vec![d(2000, 1), d(2000, 2), d(2000, 7)]);
    }

    #[test]
    fn latest_end_compares_inclusively_exit_compares_strictly() {
        // Signal exactly on the recession end, candidate the month after.
        let table = RecessionTable::new(vec![RecessionInterval::new(d(2000, 3), d(2000, 5))]).unwrap();
        let pts = monthly(d(2000, 5), &[-1.0, -1.0]);

        let latest = scan(&pts, -0.5, ThresholdDirection::Below, &CooldownGate::recession_only(), &table);
        assert_eq!(dates(&latest), vec![d(2000, 5), d(2000, 6)]);

        let exit = scan(&pts, -0.5, ThresholdDirection::Below, &CooldownGate::default(), &table);
        assert_eq!(dates(&exit), vec![d(2000, 5)]);
    }

    #[test]
    fn recession_ending_before_last_signal_does_not_release() {
        // Exit observed at 2000-03; signal at 2000-04; candidate at 2000-06 stays suppressed.
        let table = RecessionTable::new(vec![RecessionInterval::new(d(2000, 1), d(2000, 2))]).unwrap();
        let pts = monthly(d(2000, 1), &[0.0, 0.0, 0.0, -1.0, 0.0, -1.0]);
        let s = scan(&pts, -0.5, ThresholdDirection::Below, &CooldownGate::default(), &table);
        assert_eq!(dates(&s), vec![d(2000, 4)]);
    }

    #[test]
    fn state_tracks_exit_only_on_transition() {
        let table = RecessionTable::new(vec![RecessionInterval::new(d(2000, 3), d(2000, 5))]).unwrap();
        let s = CooldownState::default();
        // Inside → inside: no change.
        let s = s.observe_step(d(2000, 3), d(2000, 4), &table);
        assert_eq!(s.last_recession_end, None);
        // Outside → inside: no change.
        let s = s.observe_step(d(2000, 2), d(2000, 3), &table);
        assert_eq!(s.last_recession_end, None);
        // Inside → outside: records the end.
        let s = s.observe_step(d(2000, 5), d(2000, 6), &table);
        assert_eq!(s.last_recession_end, Some(d(2000, 5)));
    }

    #[test]
    fn permits_without_history() {
        let s = CooldownState::default();
        assert!(s.permits(d(2000, 1), &CooldownGate::recession_only(), &RecessionTable::empty()));
    }

    #[test]
    fn gate_with_no_release_reports_it() {
        let g = CooldownGate {
            release_after_gap: false,
            release_after_recession: false,
            ..CooldownGate::default()
        };
        assert!(!g.has_release());
        assert!(CooldownGate::default().has_release());
    }
}
