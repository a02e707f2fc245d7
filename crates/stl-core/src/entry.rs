//! Log entries: the in-progress one and the finished ones.

use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use serde::Serialize;

use crate::types::{ValidationError, YearMonth, sanitize_text};

/// Drops seconds and sub-second precision; entries are kept to the minute.
pub fn truncate_to_minute(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_second(0)
        .and_then(|dt| dt.with_nanosecond(0))
        .unwrap_or(dt)
}

/// Work that has been started but not stopped yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenEntry {
    pub started: NaiveDateTime,
    /// Possibly empty.
    pub task: String,
}

impl OpenEntry {
    pub fn new(started: NaiveDateTime, task: &str) -> Self {
        Self {
            started: truncate_to_minute(started),
            task: sanitize_text(task),
        }
    }

    /// Closes the entry at `stop`.
    pub fn close(&self, stop: NaiveDateTime) -> Result<ClosedEntry, ValidationError> {
        ClosedEntry::new(self.started, stop, &self.task)
    }
}

/// A finished stretch of work.
///
/// `start <= stop` always holds for values built through [`ClosedEntry::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClosedEntry {
    pub start: NaiveDateTime,
    pub stop: NaiveDateTime,
    /// Possibly empty.
    pub task: String,
}

impl ClosedEntry {
    pub fn new(
        start: NaiveDateTime,
        stop: NaiveDateTime,
        task: &str,
    ) -> Result<Self, ValidationError> {
        let start = truncate_to_minute(start);
        let stop = truncate_to_minute(stop);
        if stop < start {
            return Err(ValidationError::NegativeInterval { start, stop });
        }
        Ok(Self {
            start,
            stop,
            task: sanitize_text(task),
        })
    }

    pub fn duration(&self) -> TimeDelta {
        self.stop - self.start
    }

    /// The storage partition this entry belongs to.
    pub fn partition(&self) -> YearMonth {
        YearMonth::of(self.start.date())
    }

    pub fn starts_on(&self, date: NaiveDate) -> bool {
        self.start.date() == date
    }
}
