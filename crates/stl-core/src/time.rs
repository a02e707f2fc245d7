//! Parsing of short, user-typed time expressions.
//!
//! All relative words ("today", "last", "this") are resolved against the
//! reference instant the [`Parser`] is built with, never against the wall
//! clock, so results are deterministic.
//!
//! # Ambiguity
//!
//! Expressions made of several tokens ("15 oct", "2016 oct 15") are matched
//! by trying every assignment of tokens to fields. An expression is accepted
//! only if exactly one assignment parses; zero or several distinct matches
//! are a [`ParseError`]. Inside such expressions a year must have four
//! digits, otherwise "10 12" could be read as both October 2012 and
//! December 2010.

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta};
use thiserror::Error;

use crate::entry::truncate_to_minute;
use crate::types::YearMonth;

/// Lower-case month abbreviations and full names, January first.
pub(crate) const MONTH_NAMES: [(&str, &str); 12] = [
    ("jan", "january"),
    ("feb", "february"),
    ("mar", "march"),
    ("apr", "april"),
    ("may", "may"),
    ("jun", "june"),
    ("jul", "july"),
    ("aug", "august"),
    ("sep", "september"),
    ("oct", "october"),
    ("nov", "november"),
    ("dec", "december"),
];

const ORDERS_2: [[usize; 2]; 2] = [[0, 1], [1, 0]];
const ORDERS_3: [[usize; 3]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
];

/// The kind of value an expression was supposed to describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expression {
    Year,
    Month,
    Week,
    Date,
    Datetime,
    Dates,
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Year => "year",
            Self::Month => "month",
            Self::Week => "week",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Dates => "dates",
        };
        f.write_str(name)
    }
}

/// An expression that could not be parsed, or that was ambiguous.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("could not infer {expected}: {input}")]
pub struct ParseError {
    pub expected: Expression,
    pub input: String,
}

impl ParseError {
    fn new(expected: Expression, input: &str) -> Self {
        tracing::debug!(%expected, input, "time expression rejected");
        Self {
            expected,
            input: input.to_string(),
        }
    }
}

/// Reads a year written with exactly four digits.
fn parse_full_year(s: &str) -> Option<i32> {
    if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok().filter(|year| *year >= 1)
}

/// Reads a four-digit year, or a two-digit one (69-99 are 19xx, 00-68 20xx).
fn parse_year(s: &str) -> Option<i32> {
    parse_full_year(s).or_else(|| {
        if s.len() != 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let short: i32 = s.parse().ok()?;
        Some(if short < 69 { 2000 + short } else { 1900 + short })
    })
}

/// Reads a one- or two-digit number within `range`.
fn parse_small_number(s: &str, range: std::ops::RangeInclusive<u32>) -> Option<u32> {
    if s.is_empty() || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok().filter(|n| range.contains(n))
}

/// Reads a month number, abbreviation or full name (case-insensitive).
pub(crate) fn parse_month(s: &str) -> Option<u32> {
    if let Some(month) = parse_small_number(s, 1..=12) {
        return Some(month);
    }
    let lower = s.to_lowercase();
    MONTH_NAMES
        .iter()
        .position(|(short, long)| lower == *short || lower == *long)
        .and_then(|index| u32::try_from(index + 1).ok())
}

/// Reads a day of the month.
pub(crate) fn parse_day(s: &str) -> Option<u32> {
    parse_small_number(s, 1..=31)
}

/// Returns the only distinct candidate, or `None` if there are zero or several.
fn single<T: PartialEq>(candidates: impl IntoIterator<Item = T>) -> Option<T> {
    let mut found: Vec<T> = Vec::new();
    for candidate in candidates {
        if !found.contains(&candidate) {
            found.push(candidate);
        }
    }
    if found.len() == 1 { found.pop() } else { None }
}

/// How a token of a date span looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Year,
    Month,
    Day,
}

impl Tag {
    fn of(token: &str) -> Self {
        if token.bytes().all(|b| b.is_ascii_digit()) {
            if token.len() == 4 { Self::Year } else { Self::Day }
        } else {
            Self::Month
        }
    }
}

/// True if `tags` holds each of `wanted` exactly once.
fn is_arrangement_of(tags: &[Tag], wanted: &[Tag]) -> bool {
    tags.len() == wanted.len() && wanted.iter().all(|w| tags.iter().filter(|t| *t == w).count() == 1)
}

fn token_tagged<'a>(tokens: &[&'a str], tags: &[Tag], tag: Tag) -> Option<&'a str> {
    tags.iter().position(|t| *t == tag).map(|i| tokens[i])
}

/// A full date from three tokens tagged year, month and day in any order.
fn span_full_date(tokens: &[&str], tags: &[Tag]) -> Option<NaiveDate> {
    if !is_arrangement_of(tags, &[Tag::Year, Tag::Month, Tag::Day]) {
        return None;
    }
    NaiveDate::from_ymd_opt(
        parse_full_year(token_tagged(tokens, tags, Tag::Year)?)?,
        parse_month(token_tagged(tokens, tags, Tag::Month)?)?,
        parse_day(token_tagged(tokens, tags, Tag::Day)?)?,
    )
}

/// A date in `year` from two tokens tagged month and day in any order.
fn span_month_day(tokens: &[&str], tags: &[Tag], year: i32) -> Option<NaiveDate> {
    if !is_arrangement_of(tags, &[Tag::Month, Tag::Day]) {
        return None;
    }
    NaiveDate::from_ymd_opt(
        year,
        parse_month(token_tagged(tokens, tags, Tag::Month)?)?,
        parse_day(token_tagged(tokens, tags, Tag::Day)?)?,
    )
}

/// A date in the month of `other` from a single day token.
fn span_day(token: &str, tag: Tag, other: NaiveDate) -> Option<NaiveDate> {
    if tag != Tag::Day {
        return None;
    }
    NaiveDate::from_ymd_opt(other.year(), other.month(), parse_day(token)?)
}

/// Converts user input into years, months, dates and date spans.
#[derive(Debug, Clone, Copy)]
pub struct Parser {
    now: NaiveDateTime,
}

impl Parser {
    /// Creates a parser resolving relative expressions against `now`.
    pub const fn new(now: NaiveDateTime) -> Self {
        Self { now }
    }

    pub const fn now(&self) -> NaiveDateTime {
        self.now
    }

    fn today(&self) -> NaiveDate {
        self.now.date()
    }

    /// `""` and `"this"` mean the current year, `"last"` the previous one;
    /// otherwise a four- or two-digit year.
    pub fn extract_year(&self, s: &str) -> Result<i32, ParseError> {
        let word = s.trim().to_lowercase();
        match word.as_str() {
            "" | "this" => Ok(self.now.year()),
            "last" => Ok(self.now.year() - 1),
            _ => parse_year(&word).ok_or_else(|| ParseError::new(Expression::Year, s)),
        }
    }

    /// Returns the month described by `s`, e.g. `"oct"`, `"2016 10"`,
    /// `"october 2016"`, `"last"`.
    pub fn extract_month(&self, s: &str) -> Result<YearMonth, ParseError> {
        let current = YearMonth::of(self.today());
        let tokens: Vec<&str> = s.split_whitespace().collect();

        let month = match tokens.as_slice() {
            [] => Some(current),
            [word] => match word.to_lowercase().as_str() {
                "this" => Some(current),
                "last" => Some(current.prev()),
                _ => parse_month(word).and_then(|m| YearMonth::new(current.year(), m)),
            },
            [a, b] => {
                let pair = [*a, *b];
                single(ORDERS_2.iter().filter_map(|[y, m]| {
                    Some((parse_full_year(pair[*y])?, parse_month(pair[*m])?))
                }))
                .and_then(|(year, month)| YearMonth::new(year, month))
            }
            _ => None,
        };

        month.ok_or_else(|| ParseError::new(Expression::Month, s))
    }

    /// Returns the Monday and Sunday of the current (`""`, `"this"`) or the
    /// previous (`"last"`) week.
    pub fn extract_week(&self, s: &str) -> Result<(NaiveDate, NaiveDate), ParseError> {
        let today = self.today();
        let monday = today - TimeDelta::days(i64::from(today.weekday().num_days_from_monday()));

        let tokens: Vec<&str> = s.split_whitespace().collect();
        let monday = match tokens.as_slice() {
            [] => monday,
            [word] => match word.to_lowercase().as_str() {
                "this" => monday,
                "last" => monday - TimeDelta::days(7),
                _ => return Err(ParseError::new(Expression::Week, s)),
            },
            _ => return Err(ParseError::new(Expression::Week, s)),
        };

        Ok((monday, monday + TimeDelta::days(6)))
    }

    /// Returns the date described by `s`.
    ///
    /// Accepts ISO dates, `today`/`yesterday` (and `this`/`last`), a day of
    /// the current month, month and day in either order, or year, month and
    /// day in any order.
    pub fn extract_date(&self, s: &str) -> Result<NaiveDate, ParseError> {
        let today = self.today();
        let tokens: Vec<&str> = s.split_whitespace().collect();

        let date = match tokens.as_slice() {
            [] => Some(today),
            [word] => {
                if let Ok(date) = NaiveDate::parse_from_str(word, "%Y-%m-%d") {
                    Some(date)
                } else {
                    match word.to_lowercase().as_str() {
                        "last" | "yesterday" => today.pred_opt(),
                        "this" | "today" => Some(today),
                        _ => parse_day(word)
                            .and_then(|d| NaiveDate::from_ymd_opt(today.year(), today.month(), d)),
                    }
                }
            }
            [a, b] => {
                let pair = [*a, *b];
                single(
                    ORDERS_2
                        .iter()
                        .filter_map(|[m, d]| Some((parse_month(pair[*m])?, parse_day(pair[*d])?))),
                )
                .and_then(|(month, day)| NaiveDate::from_ymd_opt(today.year(), month, day))
            }
            [a, b, c] => {
                let triple = [*a, *b, *c];
                single(ORDERS_3.iter().filter_map(|[y, m, d]| {
                    Some((
                        parse_full_year(triple[*y])?,
                        parse_month(triple[*m])?,
                        parse_day(triple[*d])?,
                    ))
                }))
                .and_then(|(year, month, day)| NaiveDate::from_ymd_opt(year, month, day))
            }
            _ => None,
        };

        date.ok_or_else(|| ParseError::new(Expression::Date, s))
    }

    /// Parses a strict ISO datetime (`YYYY-MM-DDTHH:MM`). Seconds, if
    /// present, are dropped.
    ///
    /// Years are limited to 1..=9999, the range the pretty-printer renders
    /// with four digits.
    pub fn extract_datetime(&self, s: &str) -> Result<NaiveDateTime, ParseError> {
        let s = s.trim();
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
            .ok()
            .filter(|dt| (1..=9999).contains(&dt.year()))
            .map(truncate_to_minute)
            .ok_or_else(|| ParseError::new(Expression::Datetime, s))
    }

    /// Returns the two dates bounding the span described by `s`, earlier
    /// date first.
    ///
    /// The last one to three tokens give one end of the span (day; day and
    /// month; or day, month and year, in any order). Leading tokens give the
    /// other end, borrowing missing month and year from the trailing date;
    /// without leading tokens the other end is today. Examples, with today
    /// being 15 Oct 2016:
    ///
    /// - `"10"` is 10 to 15 Oct 2016
    /// - `"10 12 sep"` is 10 to 12 Sep 2016
    /// - `"10 sep 12 oct 2015"` is 10 Sep to 12 Oct 2015
    pub fn extract_span(&self, s: &str) -> Result<(NaiveDate, NaiveDate), ParseError> {
        let tokens: Vec<&str> = s.split_whitespace().collect();
        if !(1..=6).contains(&tokens.len()) {
            return Err(ParseError::new(Expression::Dates, s));
        }

        let (first, second) = self
            .span_from_tokens(&tokens)
            .ok_or_else(|| ParseError::new(Expression::Dates, s))?;

        if second < first {
            Ok((second, first))
        } else {
            Ok((first, second))
        }
    }

    fn span_from_tokens(&self, tokens: &[&str]) -> Option<(NaiveDate, NaiveDate)> {
        let tags: Vec<Tag> = tokens.iter().map(|t| Tag::of(t)).collect();
        let n = tokens.len();
        let today = self.today();

        if n >= 3 && is_arrangement_of(&tags[n - 3..], &[Tag::Year, Tag::Month, Tag::Day]) {
            let second = span_full_date(&tokens[n - 3..], &tags[n - 3..])?;
            let first = match n {
                6 => span_full_date(&tokens[..3], &tags[..3])?,
                5 => span_month_day(&tokens[..2], &tags[..2], second.year())?,
                4 => span_day(tokens[0], tags[0], second)?,
                _ => today,
            };
            Some((first, second))
        } else if n >= 2 && is_arrangement_of(&tags[n - 2..], &[Tag::Month, Tag::Day]) {
            let second = span_month_day(&tokens[n - 2..], &tags[n - 2..], today.year())?;
            let first = match n {
                4 => span_month_day(&tokens[..2], &tags[..2], second.year())?,
                3 => span_day(tokens[0], tags[0], second)?,
                2 => today,
                _ => return None,
            };
            Some((first, second))
        } else if tags[n - 1] == Tag::Day {
            let second = span_day(tokens[n - 1], Tag::Day, today)?;
            let first = match n {
                2 => span_day(tokens[0], tags[0], second)?,
                1 => today,
                _ => return None,
            };
            Some((first, second))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> Parser {
        // A Saturday.
        Parser::new(date(2016, 10, 15).and_hms_opt(0, 0, 0).unwrap())
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    // ========== Years ==========

    #[test]
    fn extract_year_words() {
        let p = parser();
        assert_eq!(p.extract_year("").unwrap(), 2016);
        assert_eq!(p.extract_year("this").unwrap(), 2016);
        assert_eq!(p.extract_year("LAST").unwrap(), 2015);
    }

    #[test]
    fn extract_year_digits() {
        let p = parser();
        assert_eq!(p.extract_year("1987").unwrap(), 1987);
        assert_eq!(p.extract_year("0999").unwrap(), 999);
        assert_eq!(p.extract_year("16").unwrap(), 2016);
        assert_eq!(p.extract_year("69").unwrap(), 1969);
        assert!(p.extract_year("201").is_err());
        assert!(p.extract_year("oct").is_err());
        assert!(p.extract_year("0000").is_err());
    }

    // ========== Months ==========

    #[test]
    fn extract_month_words() {
        let p = parser();
        assert_eq!(p.extract_month("").unwrap(), ym(2016, 10));
        assert_eq!(p.extract_month("this").unwrap(), ym(2016, 10));
        assert_eq!(p.extract_month("last").unwrap(), ym(2016, 9));
    }

    #[test]
    fn extract_month_last_rolls_back_the_year_in_january() {
        let p = Parser::new(date(2017, 1, 3).and_hms_opt(12, 0, 0).unwrap());
        assert_eq!(p.extract_month("last").unwrap(), ym(2016, 12));
    }

    #[test]
    fn extract_month_single_token_uses_current_year() {
        let p = parser();
        for s in ["3", "03", "mar", "March", "MAR"] {
            assert_eq!(p.extract_month(s).unwrap(), ym(2016, 3), "{s}");
        }
        assert!(p.extract_month("13").is_err());
        assert!(p.extract_month("marc").is_err());
    }

    #[test]
    fn extract_month_accepts_both_orders() {
        let p = parser();
        for s in ["2014 feb", "feb 2014", "february 2014", "2014 2", "02 2014"] {
            assert_eq!(p.extract_month(s).unwrap(), ym(2014, 2), "{s}");
        }
    }

    #[test]
    fn extract_month_rejects_ambiguous_or_unparseable() {
        let p = parser();
        assert!(p.extract_month("10 20").is_err());
        assert!(p.extract_month("oct nov").is_err());
        assert!(p.extract_month("2014 2015").is_err());
        assert!(p.extract_month("oct 2016 x").is_err());
    }

    // ========== Weeks ==========

    #[test]
    fn extract_week() {
        let p = parser();
        let this = (date(2016, 10, 10), date(2016, 10, 16));
        assert_eq!(p.extract_week("").unwrap(), this);
        assert_eq!(p.extract_week("this").unwrap(), this);
        assert_eq!(
            p.extract_week("last").unwrap(),
            (date(2016, 10, 3), date(2016, 10, 9))
        );
        assert!(p.extract_week("next").is_err());
        assert!(p.extract_week("last week").is_err());
    }

    #[test]
    fn extract_week_on_a_monday() {
        let p = Parser::new(date(2016, 10, 10).and_hms_opt(8, 0, 0).unwrap());
        assert_eq!(
            p.extract_week("").unwrap(),
            (date(2016, 10, 10), date(2016, 10, 16))
        );
    }

    // ========== Dates ==========

    #[test]
    fn extract_date_words() {
        let p = parser();
        for s in ["", "this", "today", "Today"] {
            assert_eq!(p.extract_date(s).unwrap(), date(2016, 10, 15), "{s:?}");
        }
        for s in ["last", "yesterday"] {
            assert_eq!(p.extract_date(s).unwrap(), date(2016, 10, 14), "{s}");
        }
    }

    #[test]
    fn extract_date_iso() {
        let p = parser();
        assert_eq!(p.extract_date("2014-02-28").unwrap(), date(2014, 2, 28));
        assert!(p.extract_date("2014-02-30").is_err());
    }

    #[test]
    fn extract_date_day_of_current_month() {
        let p = parser();
        assert_eq!(p.extract_date("3").unwrap(), date(2016, 10, 3));
        assert_eq!(p.extract_date("31").unwrap(), date(2016, 10, 31));
        assert!(p.extract_date("32").is_err());
    }

    #[test]
    fn extract_date_day_that_month_lacks() {
        let p = Parser::new(date(2016, 9, 1).and_hms_opt(0, 0, 0).unwrap());
        assert!(p.extract_date("31").is_err());
    }

    #[test]
    fn extract_date_all_orders() {
        let p = parser();
        let tokens = ["2014", "feb", "28"];
        for order in ORDERS_3 {
            let s = order.map(|i| tokens[i]).join(" ");
            assert_eq!(p.extract_date(&s).unwrap(), date(2014, 2, 28), "{s}");
        }
        for s in ["feb 28", "28 feb", "28 february"] {
            assert_eq!(p.extract_date(s).unwrap(), date(2016, 2, 28), "{s}");
        }
    }

    #[test]
    fn extract_date_rejects_ambiguity() {
        let p = parser();
        // October 12th or December 10th.
        assert!(p.extract_date("10 12").is_err());
        assert!(p.extract_date("2014 10 12").is_err());
        assert!(p.extract_date("1 2 3 4").is_err());
    }

    #[test]
    fn extract_date_repeated_token_is_not_ambiguous() {
        let p = parser();
        assert_eq!(p.extract_date("10 10").unwrap(), date(2016, 10, 10));
    }

    #[test]
    fn extract_date_rejects_impossible_dates() {
        let p = parser();
        assert!(p.extract_date("30 feb").is_err());
        assert!(p.extract_date("29 feb 2015").is_err());
        assert_eq!(p.extract_date("29 feb 2016").unwrap(), date(2016, 2, 29));
    }

    // ========== Datetimes ==========

    #[test]
    fn extract_datetime_iso() {
        let p = parser();
        let expected = date(2016, 10, 10).and_hms_opt(9, 30, 0).unwrap();
        assert_eq!(p.extract_datetime("2016-10-10T09:30").unwrap(), expected);
        assert_eq!(p.extract_datetime("2016-10-10T09:30:45").unwrap(), expected);
        assert_eq!(
            p.extract_datetime("2016-10-10T09:30:45.123456").unwrap(),
            expected
        );
    }

    #[test]
    fn extract_datetime_rejects_other_shapes() {
        let p = parser();
        for s in ["", "2016-10-10", "2016-10-10 09:30", "10 oct 09:30", "2016-10-10T25:00"] {
            assert!(p.extract_datetime(s).is_err(), "{s}");
        }
    }

    #[test]
    fn extract_datetime_keeps_to_four_digit_years() {
        let p = parser();
        for s in ["+10000-01-01T09:00", "0000-06-01T09:00", "-0001-06-01T09:00"] {
            assert!(p.extract_datetime(s).is_err(), "{s}");
        }

        let last = p.extract_datetime("9999-12-31T23:59").unwrap();
        let rendered = crate::pretty::format_date(last.date());
        assert_eq!(p.extract_date(&rendered).unwrap(), last.date());
    }

    // ========== Spans ==========

    #[test]
    fn extract_span_shapes() {
        let p = parser();
        let cases = [
            ("10", (date(2016, 10, 10), date(2016, 10, 15))),
            ("10 12", (date(2016, 10, 10), date(2016, 10, 12))),
            ("10 12 sep", (date(2016, 9, 10), date(2016, 9, 12))),
            ("10 sep 12 oct", (date(2016, 9, 10), date(2016, 10, 12))),
            ("10 sep 12 oct 2015", (date(2015, 9, 10), date(2015, 10, 12))),
            ("10 sep 2014 12 oct 2015", (date(2014, 9, 10), date(2015, 10, 12))),
        ];
        for (s, expected) in cases {
            assert_eq!(p.extract_span(s).unwrap(), expected, "{s}");
        }
    }

    #[test]
    fn extract_span_normalises_order() {
        let p = parser();
        let expected = (date(2016, 9, 10), date(2016, 10, 12));
        assert_eq!(p.extract_span("10 sep 12 oct").unwrap(), expected);
        assert_eq!(p.extract_span("12 oct 10 sep").unwrap(), expected);
    }

    #[test]
    fn extract_span_single_date_runs_until_today() {
        let p = parser();
        let tokens = ["2014", "sep", "10"];
        for order in ORDERS_3 {
            let s = order.map(|i| tokens[i]).join(" ");
            assert_eq!(
                p.extract_span(&s).unwrap(),
                (date(2014, 9, 10), date(2016, 10, 15)),
                "{s}"
            );
        }
        assert_eq!(
            p.extract_span("sep 10").unwrap(),
            (date(2016, 9, 10), date(2016, 10, 15))
        );
    }

    #[test]
    fn extract_span_leading_day_with_full_date() {
        let p = parser();
        assert_eq!(
            p.extract_span("10 12 oct 2015").unwrap(),
            (date(2015, 10, 10), date(2015, 10, 12))
        );
    }

    #[test]
    fn extract_span_errors() {
        let p = parser();
        for s in [
            "",
            "10 sep sep",
            "10 2016 sep sep",
            "sep 2016",
            "1 2 3",
            "31 sep",
            "1 2 3 4 5 6 7",
            "oct 10 sep 12 oct 2015",
        ] {
            assert!(p.extract_span(s).is_err(), "{s:?}");
        }
    }

    #[test]
    fn parse_error_names_the_input() {
        let err = parser().extract_month("10 20").unwrap_err();
        assert_eq!(err.expected, Expression::Month);
        assert_eq!(err.to_string(), "could not infer month: 10 20");
    }
}
