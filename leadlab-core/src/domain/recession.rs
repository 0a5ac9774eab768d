//! Historical recession windows: the ground truth signals are scored against.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A closed date interval `[start, end]` during which the economy was in recession.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecessionInterval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl RecessionInterval {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Inclusive on both ends.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecessionError {
    #[error("recession ends before it starts: {start} > {end}")]
    Inverted { start: NaiveDate, end: NaiveDate },

    #[error("recessions out of order: {next} starts before {previous}")]
    Unsorted { previous: NaiveDate, next: NaiveDate },

    #[error("recession starting {next} overlaps the one ending {previous_end}")]
    Overlapping {
        previous_end: NaiveDate,
        next: NaiveDate,
    },
}

/// Chronologically sorted, non-overlapping recession intervals.
///
/// Loaded once per analysis and never mutated. The invariants are checked at
/// construction so lookups can rely on ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RecessionInterval>", into = "Vec<RecessionInterval>")]
pub struct RecessionTable {
    intervals: Vec<RecessionInterval>,
}

impl RecessionTable {
    /// Validate and wrap `intervals`.
    pub fn new(intervals: Vec<RecessionInterval>) -> Result<Self, RecessionError> {
        for r in &intervals {
            if r.start > r.end {
                return Err(RecessionError::Inverted {
                    start: r.start,
                    end: r.end,
                });
            }
        }
        for pair in intervals.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            if next.start < prev.start {
                return Err(RecessionError::Unsorted {
                    previous: prev.start,
                    next: next.start,
                });
            }
            if next.start <= prev.end {
                return Err(RecessionError::Overlapping {
                    previous_end: prev.end,
                    next: next.start,
                });
            }
        }
        Ok(Self { intervals })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn intervals(&self) -> &[RecessionInterval] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RecessionInterval> {
        self.intervals.iter()
    }

    /// The interval containing `date`, if any.
    pub fn containing(&self, date: NaiveDate) -> Option<&RecessionInterval> {
        self.intervals.iter().find(|r| r.contains(date))
    }

    /// Earliest interval starting strictly after `date`.
    pub fn next_after(&self, date: NaiveDate) -> Option<&RecessionInterval> {
        self.intervals.iter().find(|r| r.start > date)
    }

    /// Latest interval whose end is strictly before `date`.
    pub fn last_ended_before(&self, date: NaiveDate) -> Option<&RecessionInterval> {
        self.intervals.iter().rev().find(|r| r.end < date)
    }
}

impl TryFrom<Vec<RecessionInterval>> for RecessionTable {
    type Error = RecessionError;

    fn try_from(intervals: Vec<RecessionInterval>) -> Result<Self, Self::Error> {
        Self::new(intervals)
    }
}

impl From<RecessionTable> for Vec<RecessionInterval> {
    fn from(table: RecessionTable) -> Self {
        table.intervals
    }
}

impl<'a> IntoIterator for &'a RecessionTable {
    type Item = &'a RecessionInterval;
    type IntoIter = std::slice::Iter<'a, RecessionInterval>;

    fn into_iter(self) -> Self::IntoIter {
        self.intervals.iter()
    }
}
