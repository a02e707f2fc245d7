//! Status command: the work in progress, or a summary of a period or task.

use std::io::Write;

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use clap::{ArgGroup, Args};
use serde::Serialize;

use stl_core::pretty::{format_date, format_month};
use stl_core::status::{
    PeriodSummary, TaskSummary, report_current, report_period, report_task,
};
use stl_core::{ClosedEntry, OpenEntry, Parser, TaskName};
use stl_db::Database;

/// Arguments of the status command.
///
/// Period flags take a time expression; given without one they mean the
/// current day, week, month or year.
#[derive(Debug, Args)]
#[command(group(ArgGroup::new("query").multiple(false)))]
pub struct StatusArgs {
    /// Summarise a day, e.g. "yesterday" or "15 oct".
    #[arg(short, long, group = "query", num_args = 0.., value_name = "DATE")]
    pub day: Option<Vec<String>>,

    /// Summarise the week (Monday to Sunday) of a date, or "last".
    #[arg(short, long, group = "query", num_args = 0.., value_name = "DATE")]
    pub week: Option<Vec<String>>,

    /// Summarise a month, e.g. "oct 2016" or "last".
    #[arg(short, long, group = "query", num_args = 0.., value_name = "MONTH")]
    pub month: Option<Vec<String>>,

    /// Summarise a year.
    #[arg(short, long, group = "query", num_args = 0.., value_name = "YEAR")]
    pub year: Option<Vec<String>>,

    /// Summarise the days between two dates, e.g. "10 sep 12 oct".
    #[arg(short, long, group = "query", num_args = 0.., value_name = "DATES")]
    pub span: Option<Vec<String>>,

    /// Summarise everything logged on a task.
    #[arg(short, long, group = "query", value_name = "TASK")]
    pub task: Option<String>,

    /// Print the summary as JSON.
    #[arg(long)]
    pub json: bool,
}

/// What the user asked about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Current,
    Day(String),
    Week(String),
    Month(String),
    Year(String),
    Span(String),
    Task(String),
}

impl StatusArgs {
    pub fn query(&self) -> Query {
        let join = |words: &Vec<String>| words.join(" ");
        if let Some(words) = &self.day {
            Query::Day(join(words))
        } else if let Some(words) = &self.week {
            Query::Week(join(words))
        } else if let Some(words) = &self.month {
            Query::Month(join(words))
        } else if let Some(words) = &self.year {
            Query::Year(join(words))
        } else if let Some(words) = &self.span {
            Query::Span(join(words))
        } else if let Some(task) = &self.task {
            Query::Task(task.clone())
        } else {
            Query::Current
        }
    }
}

#[derive(Debug, Serialize)]
struct CurrentJson<'a> {
    task: &'a str,
    started: NaiveDateTime,
    elapsed_seconds: i64,
}

fn span_label(first: NaiveDate, last: NaiveDate) -> String {
    format!("{} - {}", format_date(first), format_date(last))
}

pub fn run<W: Write>(writer: &mut W, db: &Database, parser: &Parser, args: &StatusArgs) -> Result<()> {
    let query = args.query();
    tracing::debug!(?query, "status");

    let (period, entries) = match query {
        Query::Current => {
            let open = db.get_open(false)?;
            return write_current(writer, open.as_ref(), parser.now(), args.json);
        }
        Query::Task(task) => return write_task(writer, db, &task, args.json),
        Query::Day(expr) => {
            let date = parser.extract_date(&expr)?;
            (format_date(date), db.query_day(date)?)
        }
        Query::Week(expr) => {
            let (monday, sunday) = parser.extract_week(&expr)?;
            (span_label(monday, sunday), db.query_span(monday, sunday)?)
        }
        Query::Month(expr) => {
            let month = parser.extract_month(&expr)?;
            (format_month(month), db.query_month(month)?)
        }
        Query::Year(expr) => {
            let year = parser.extract_year(&expr)?;
            (year.to_string(), db.query_year(year)?)
        }
        Query::Span(expr) => {
            let (first, last) = parser.extract_span(&expr)?;
            (span_label(first, last), db.query_span(first, last)?)
        }
    };

    if args.json {
        let summary = PeriodSummary::from_entries(&period, &entries);
        writeln!(writer, "{}", serde_json::to_string_pretty(&summary)?)?;
    } else {
        writeln!(writer, "{}", report_period(&period, &entries))?;
    }
    Ok(())
}

fn write_current<W: Write>(
    writer: &mut W,
    open: Option<&OpenEntry>,
    now: NaiveDateTime,
    json: bool,
) -> Result<()> {
    if json {
        let current = open.map(|open| CurrentJson {
            task: &open.task,
            started: open.started,
            elapsed_seconds: (now - open.started).num_seconds(),
        });
        writeln!(writer, "{}", serde_json::to_string_pretty(&current)?)?;
    } else {
        writeln!(writer, "{}", report_current(open, now))?;
    }
    Ok(())
}

/// Gathers the entries of `task` from the months the task index lists.
fn write_task<W: Write>(writer: &mut W, db: &Database, task: &str, json: bool) -> Result<()> {
    let task = TaskName::new(task)?;

    let mut entries: Vec<ClosedEntry> = Vec::new();
    for month in db.query_task_months(task.as_str())? {
        entries.extend(
            db.query_month(month)?
                .into_iter()
                .filter(|e| e.task == task.as_str()),
        );
    }

    if json {
        let summary = TaskSummary::from_entries(task.as_str(), &entries);
        writeln!(writer, "{}", serde_json::to_string_pretty(&summary)?)?;
    } else {
        writeln!(writer, "{}", report_task(task.as_str(), &entries))?;
    }
    Ok(())
}
