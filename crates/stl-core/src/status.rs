//! Summaries of logged work, rendered for humans.

use std::collections::HashMap;
use std::fmt;

use chrono::{NaiveDateTime, TimeDelta};
use serde::Serialize;

use crate::entry::{ClosedEntry, OpenEntry};
use crate::pretty::{format_datetime, format_duration};

/// Shown by [`report_current`] when no work is in progress.
pub const NOTHING_IN_PROGRESS: &str = "nothing in progress";

/// Describes the work in progress, if any, as of `now`.
pub fn report_current(open: Option<&OpenEntry>, now: NaiveDateTime) -> String {
    let Some(open) = open else {
        return NOTHING_IN_PROGRESS.to_string();
    };

    let mut lines = Vec::with_capacity(3);
    if !open.task.is_empty() {
        lines.push(format!("task: {}", open.task));
    }
    lines.push(format!("started: {}", format_datetime(open.started)));
    lines.push(format!("elapsed: {}", format_duration(now - open.started)));
    lines.join("\n")
}

/// Time spent on one task within a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskTotal {
    pub task: String,
    pub seconds: i64,
}

/// Totals over a period, broken down by task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodSummary {
    pub period: String,
    /// Named tasks only, ascending by time spent, ties by name.
    pub tasks: Vec<TaskTotal>,
    /// Includes entries without a task.
    pub total_seconds: i64,
}

impl PeriodSummary {
    pub fn from_entries(period: impl Into<String>, entries: &[ClosedEntry]) -> Self {
        let mut per_task: HashMap<&str, i64> = HashMap::new();
        let mut total_seconds = 0;

        for entry in entries {
            let seconds = entry.duration().num_seconds();
            total_seconds += seconds;
            if !entry.task.is_empty() {
                *per_task.entry(entry.task.as_str()).or_default() += seconds;
            }
        }

        let mut tasks: Vec<TaskTotal> = per_task
            .into_iter()
            .map(|(task, seconds)| TaskTotal {
                task: task.to_string(),
                seconds,
            })
            .collect();
        tasks.sort_by(|a, b| a.seconds.cmp(&b.seconds).then_with(|| a.task.cmp(&b.task)));

        Self {
            period: period.into(),
            tasks,
            total_seconds,
        }
    }

    pub fn total(&self) -> TimeDelta {
        TimeDelta::seconds(self.total_seconds)
    }
}

impl fmt::Display for PeriodSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.period)?;
        if self.tasks.is_empty() {
            writeln!(f, "tasks: -")?;
        } else {
            writeln!(f, "tasks:")?;
            for task in &self.tasks {
                writeln!(
                    f,
                    "  {}: {}",
                    task.task,
                    format_duration(TimeDelta::seconds(task.seconds))
                )?;
            }
        }
        write!(f, "total: {}", format_duration(self.total()))
    }
}

/// Renders the summary of `entries` under the heading `period`.
pub fn report_period(period: &str, entries: &[ClosedEntry]) -> String {
    PeriodSummary::from_entries(period, entries).to_string()
}

/// Everything logged on a single task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    pub task: String,
    pub first_start: NaiveDateTime,
    pub last_stop: NaiveDateTime,
    pub total_seconds: i64,
    pub entries: usize,
}

impl TaskSummary {
    /// Summarises the entries of `entries` that belong to `task`.
    ///
    /// Returns `None` if none do.
    pub fn from_entries(task: &str, entries: &[ClosedEntry]) -> Option<Self> {
        let mut matching = entries.iter().filter(|e| e.task == task);
        let first = matching.next()?;

        let mut summary = Self {
            task: task.to_string(),
            first_start: first.start,
            last_stop: first.stop,
            total_seconds: first.duration().num_seconds(),
            entries: 1,
        };
        for entry in matching {
            summary.first_start = summary.first_start.min(entry.start);
            summary.last_stop = summary.last_stop.max(entry.stop);
            summary.total_seconds += entry.duration().num_seconds();
            summary.entries += 1;
        }
        Some(summary)
    }
}

impl fmt::Display for TaskSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "task: {}", self.task)?;
        writeln!(f, "first start: {}", format_datetime(self.first_start))?;
        writeln!(f, "last stop: {}", format_datetime(self.last_stop))?;
        write!(
            f,
            "total: {}",
            format_duration(TimeDelta::seconds(self.total_seconds))
        )
    }
}

/// Renders everything logged on `task`, or a not-found line.
pub fn report_task(task: &str, entries: &[ClosedEntry]) -> String {
    TaskSummary::from_entries(task, entries)
        .map_or_else(|| format!("no records of {task}"), |summary| summary.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;
    use insta::assert_snapshot;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2016, 10, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn entry(start: NaiveDateTime, stop: NaiveDateTime, task: &str) -> ClosedEntry {
        ClosedEntry::new(start, stop, task).unwrap()
    }

    #[test]
    fn current_with_nothing_open() {
        assert_eq!(report_current(None, at(15, 12, 0)), NOTHING_IN_PROGRESS);
    }

    #[test]
    fn current_with_task() {
        let open = OpenEntry::new(at(15, 9, 0), "writing");
        assert_snapshot!(report_current(Some(&open), at(15, 10, 30)), @r"
        task: writing
        started: 15 oct 2016 09:00
        elapsed: 1 hour, 30 minutes
        ");
    }

    #[test]
    fn current_without_task_omits_task_line() {
        let open = OpenEntry::new(at(15, 9, 0), "");
        assert_snapshot!(report_current(Some(&open), at(15, 9, 0)), @r"
        started: 15 oct 2016 09:00
        elapsed: -
        ");
    }

    #[test]
    fn period_sorts_tasks_by_ascending_time() {
        let entries = [
            entry(at(10, 9, 0), at(10, 10, 30), "a"),
            entry(at(10, 11, 0), at(10, 11, 30), "b"),
        ];
        let summary = PeriodSummary::from_entries("10 oct 2016", &entries);
        assert_eq!(summary.total(), TimeDelta::hours(2));
        assert_eq!(summary.tasks[0].task, "b");
        assert_eq!(summary.tasks[1].task, "a");

        assert_snapshot!(summary.to_string(), @r"
        10 oct 2016
        tasks:
          b: 30 minutes
          a: 1 hour, 30 minutes
        total: 2 hours
        ");
    }

    #[test]
    fn period_ties_are_ordered_by_name() {
        let entries = [
            entry(at(10, 9, 0), at(10, 10, 0), "zeta"),
            entry(at(10, 10, 0), at(10, 11, 0), "alpha"),
        ];
        let summary = PeriodSummary::from_entries("x", &entries);
        let names: Vec<&str> = summary.tasks.iter().map(|t| t.task.as_str()).collect();
        assert_eq!(names, ["alpha", "zeta"]);
    }

    #[test]
    fn period_merges_entries_of_the_same_task() {
        let entries = [
            entry(at(10, 9, 0), at(10, 10, 0), "a"),
            entry(at(11, 9, 0), at(11, 9, 45), ""),
            entry(at(12, 9, 0), at(12, 10, 0), "a"),
        ];
        let summary = PeriodSummary::from_entries("oct 2016", &entries);
        assert_eq!(
            summary.tasks,
            vec![TaskTotal {
                task: "a".to_string(),
                seconds: 7200,
            }]
        );
        assert_eq!(summary.total_seconds, 2 * 3600 + 45 * 60);
    }

    #[test]
    fn period_without_tasks_uses_placeholders() {
        assert_snapshot!(report_period("2016", &[]), @r"
        2016
        tasks: -
        total: -
        ");
    }

    #[test]
    fn task_summary_spans_all_matching_entries() {
        let entries = [
            entry(at(3, 9, 0), at(3, 10, 0), "docs"),
            entry(at(4, 9, 0), at(4, 12, 0), "other"),
            entry(at(5, 14, 0), at(5, 14, 20), "docs"),
        ];
        assert_snapshot!(report_task("docs", &entries), @r"
        task: docs
        first start: 03 oct 2016 09:00
        last stop: 05 oct 2016 14:20
        total: 1 hour, 20 minutes
        ");
    }

    #[test]
    fn task_summary_not_found() {
        assert_eq!(report_task("nope", &[]), "no records of nope");
        assert!(TaskSummary::from_entries("nope", &[]).is_none());
    }
}
