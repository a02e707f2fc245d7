//! Human-readable rendering of dates, datetimes and durations.
//!
//! Dates are rendered so that [`Parser`](crate::Parser) reads them back:
//! `extract_date(format_date(d)) == d` and
//! `extract_month(format_month(m)) == m`.

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta};

use crate::time::MONTH_NAMES;
use crate::types::YearMonth;

/// What [`format_duration`] renders for a zero duration.
pub const EMPTY_DURATION: &str = "-";

/// `"05 oct 2016"`.
pub fn format_date(date: NaiveDate) -> String {
    format!("{:02} {}", date.day(), format_month(YearMonth::of(date)))
}

/// `"oct 2016"`.
pub fn format_month(month: YearMonth) -> String {
    let index = usize::try_from(month.month() - 1).unwrap_or_default();
    format!("{} {:04}", MONTH_NAMES[index].0, month.year())
}

/// `"05 oct 2016 09:30"`.
pub fn format_datetime(dt: NaiveDateTime) -> String {
    format!("{} {}", format_date(dt.date()), dt.format("%H:%M"))
}

/// `"1 hour, 5 minutes"`.
///
/// Hours are the largest unit since the length of a working day is a matter
/// of opinion. Zero-valued units are left out; a zero (or negative) duration
/// renders as [`EMPTY_DURATION`].
pub fn format_duration(duration: TimeDelta) -> String {
    let total = duration.num_seconds().max(0);
    let parts = [
        (total / 3600, "hour"),
        (total % 3600 / 60, "minute"),
        (total % 60, "second"),
    ];

    let rendered: Vec<String> = parts
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| {
            if *n == 1 {
                format!("{n} {unit}")
            } else {
                format!("{n} {unit}s")
            }
        })
        .collect();

    if rendered.is_empty() {
        EMPTY_DURATION.to_string()
    } else {
        rendered.join(", ")
    }
}
