//! Harvesting log entries from foreign text files.
//!
//! A [`Scanner`] pattern is a regular expression that may also contain the
//! strftime directives `%Y %y %m %b %B %d %H %M %S`. The first occurrence of
//! a directive describes the start of an entry, the second one its stop. An
//! optional `(?P<task>...)` group captures the task. For example
//! `%Y-%m-%d %H:%M-%H:%M (?P<task>.*)` matches
//! `2016-10-10 09:00-12:30 writing`.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use regex::{Captures, Regex};
use thiserror::Error;

use crate::entry::ClosedEntry;
use crate::time::{parse_day, parse_month};

/// Directives and the text they match.
const DIRECTIVES: [(&str, &str); 9] = [
    ("%Y", "[0-9]{4}"),
    ("%y", "[0-9]{2}"),
    ("%m", "[0-9]{1,2}"),
    ("%b", "[[:alpha:]]{3}"),
    ("%B", "[[:alpha:]]+"),
    ("%d", "[0-9]{1,2}"),
    ("%H", "[0-9]{1,2}"),
    ("%M", "[0-9]{2}"),
    ("%S", "[0-9]{2}"),
];

/// Errors raised while building a scanner or scanning text.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("directive {directive} appears more than twice in the pattern")]
    RepeatedDirective { directive: &'static str },

    #[error("invalid pattern")]
    Pattern(#[from] regex::Error),

    #[error("line {line}: could not determine the {field} of the {endpoint}")]
    MissingField {
        line: usize,
        field: &'static str,
        endpoint: &'static str,
    },

    #[error("line {line}: invalid {endpoint} time")]
    InvalidTime { line: usize, endpoint: &'static str },

    #[error("line {line}: negative time interval from {start} to {stop}")]
    NegativeInterval {
        line: usize,
        start: NaiveDateTime,
        stop: NaiveDateTime,
    },
}

/// Date fields assumed for lines that do not spell them out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanDefaults {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl ScanDefaults {
    fn from_date(date: NaiveDate) -> Self {
        Self {
            year: Some(date.year()),
            month: Some(date.month()),
            day: Some(date.day()),
        }
    }
}

/// Replaces every directive with a named group: `%H` becomes `(?P<H0>...)`
/// the first time and `(?P<H1>...)` the second time.
fn expand_directives(pattern: &str) -> Result<String, ScanError> {
    let mut pattern = pattern.to_string();

    for (directive, body) in DIRECTIVES {
        let letter = &directive[1..];
        let mut count = 0;
        while let Some(pos) = pattern.find(directive) {
            if count == 2 {
                return Err(ScanError::RepeatedDirective { directive });
            }
            let group = format!("(?P<{letter}{count}>{body})");
            pattern.replace_range(pos..pos + directive.len(), &group);
            count += 1;
        }
    }

    Ok(pattern)
}

/// Extracts entries from lines matching a pattern.
#[derive(Debug, Clone)]
pub struct Scanner {
    regex: Regex,
    defaults: ScanDefaults,
}

impl Scanner {
    pub fn new(pattern: &str, defaults: ScanDefaults) -> Result<Self, ScanError> {
        let expanded = expand_directives(pattern)?;
        tracing::debug!(pattern, %expanded, "compiling scanner pattern");
        let regex = Regex::new(&format!("^(?:{expanded})"))?;
        Ok(Self { regex, defaults })
    }

    /// Returns the entry found in `text`, or `None` if it does not match.
    ///
    /// `line` is only used in error messages.
    pub fn scan_line(&self, text: &str, line: usize) -> Result<Option<ClosedEntry>, ScanError> {
        let Some(caps) = self.regex.captures(text) else {
            return Ok(None);
        };

        let start = endpoint(&caps, 0, self.defaults, line)?;
        let stop = endpoint(&caps, 1, ScanDefaults::from_date(start.date()), line)?;
        let task = caps.name("task").map_or("", |m| m.as_str());

        ClosedEntry::new(start, stop, task)
            .map(Some)
            .map_err(|_| ScanError::NegativeInterval { line, start, stop })
    }

    /// Returns every entry found in `text`, one candidate per line.
    pub fn scan_str(&self, text: &str) -> Result<Vec<ClosedEntry>, ScanError> {
        let mut entries = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if let Some(entry) = self.scan_line(line, index + 1)? {
                entries.push(entry);
            }
        }
        Ok(entries)
    }
}

fn group<'t>(caps: &Captures<'t>, letter: char, index: usize) -> Option<&'t str> {
    caps.name(&format!("{letter}{index}")).map(|m| m.as_str())
}

fn endpoint(
    caps: &Captures<'_>,
    index: usize,
    defaults: ScanDefaults,
    line: usize,
) -> Result<NaiveDateTime, ScanError> {
    let name = if index == 0 { "start" } else { "stop" };
    let missing = |field| ScanError::MissingField {
        line,
        field,
        endpoint: name,
    };
    let invalid = || ScanError::InvalidTime {
        line,
        endpoint: name,
    };

    let year = match (group(caps, 'Y', index), group(caps, 'y', index)) {
        (Some(year), _) => Some(year.parse().map_err(|_| invalid())?),
        (None, Some(short)) => {
            let short: i32 = short.parse().map_err(|_| invalid())?;
            Some(if short < 69 { 2000 + short } else { 1900 + short })
        }
        (None, None) => defaults.year,
    }
    .ok_or_else(|| missing("year"))?;

    let month = match ['m', 'b', 'B']
        .into_iter()
        .find_map(|letter| group(caps, letter, index))
    {
        Some(month) => Some(parse_month(month).ok_or_else(invalid)?),
        None => defaults.month,
    }
    .ok_or_else(|| missing("month"))?;

    let day = match group(caps, 'd', index) {
        Some(day) => Some(parse_day(day).ok_or_else(invalid)?),
        None => defaults.day,
    }
    .ok_or_else(|| missing("day"))?;

    let hour: u32 = group(caps, 'H', index)
        .ok_or_else(|| missing("hour"))?
        .parse()
        .map_err(|_| invalid())?;
    let minute: u32 = group(caps, 'M', index).map_or(Ok(0), str::parse).map_err(|_| invalid())?;
    let second: u32 = group(caps, 'S', index).map_or(Ok(0), str::parse).map_err(|_| invalid())?;

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
    let time = NaiveTime::from_hms_opt(hour, minute, second).ok_or_else(invalid)?;
    Ok(date.and_time(time))
}
