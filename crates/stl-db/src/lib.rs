//! Storage layer for the stl time logger.
//!
//! Entries live in plain tab-separated text files under a root directory so
//! that they can be read and fixed by hand:
//!
//! ```text
//! <root>/current          <start>\t<task>                  (zero or one line)
//! <root>/<YYYY>/<MM>      <start>\t<stop>\t<task>          (one line per entry)
//! <root>/tasks            <task>\t<YYYY-MM>,<YYYY-MM>,...  (one line per task)
//! ```
//!
//! Timestamps use the `YYYY-MM-DD HH:MM` format.
//!
//! # Consistency
//!
//! Every write replaces a whole file: the new content goes to a temporary
//! file in the same directory which is then renamed over the old one. There
//! is no locking; a single writer is assumed.
//!
//! Malformed records are reported as [`DbError::Corrupt`] naming the file and
//! line. Nothing is repaired automatically.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use stl_core::{ClosedEntry, OpenEntry, TaskName, ValidationError, YearMonth};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Format of every timestamp in the storage files.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

const CURRENT_FILE: &str = "current";
const TASKS_FILE: &str = "tasks";

/// Storage errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// The storage root does not exist or is not a directory.
    #[error("storage directory not found: {}", .0.display())]
    MissingRoot(PathBuf),

    /// Reading or writing a file failed.
    #[error("failed to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A stored record could not be read.
    #[error("corrupt record in {}, line {line}: {reason}", path.display())]
    Corrupt {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// The task index holds several records for one task.
    #[error("task {task:?} has more than one record in {}", path.display())]
    DuplicateTask { path: PathBuf, task: String },

    /// The caller passed an invalid value.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> DbError + '_ {
    move |source| DbError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn corrupt(path: &Path, line: usize, reason: impl Into<String>) -> DbError {
    DbError::Corrupt {
        path: path.to_path_buf(),
        line,
        reason: reason.into(),
    }
}

/// Returns the content of `path`, or `None` if the file does not exist.
fn read_optional(path: &Path) -> Result<Option<String>, DbError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_error(path)(e)),
    }
}

/// Replaces the content of `path`, creating its parent directory if needed.
fn write_atomic(path: &Path, content: &str) -> Result<(), DbError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(io_error(parent))?;

    let mut file = NamedTempFile::new_in(parent).map_err(io_error(parent))?;
    file.write_all(content.as_bytes()).map_err(io_error(path))?;
    file.persist(path).map_err(|e| io_error(path)(e.error))?;
    Ok(())
}

fn parse_timestamp(s: &str, path: &Path, line: usize) -> Result<NaiveDateTime, DbError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map_err(|_| corrupt(path, line, format!("invalid timestamp {s:?}")))
}

/// Iterates the non-blank lines of `content` with 1-based line numbers.
fn records(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| (index + 1, line))
}

fn format_closed(entry: &ClosedEntry) -> String {
    format!(
        "{}\t{}\t{}\n",
        entry.start.format(TIMESTAMP_FORMAT),
        entry.stop.format(TIMESTAMP_FORMAT),
        entry.task
    )
}

fn parse_closed(record: &str, path: &Path, line: usize) -> Result<ClosedEntry, DbError> {
    let fields: Vec<&str> = record.split('\t').collect();
    let [start, stop, task] = fields.as_slice() else {
        return Err(corrupt(
            path,
            line,
            format!("expected 3 tab-separated fields, found {}", fields.len()),
        ));
    };

    let start = parse_timestamp(start, path, line)?;
    let stop = parse_timestamp(stop, path, line)?;
    ClosedEntry::new(start, stop, task).map_err(|e| corrupt(path, line, e.to_string()))
}

/// One line of the task index.
#[derive(Debug)]
struct TaskRecord {
    task: String,
    months: BTreeSet<YearMonth>,
}

fn parse_task_record(record: &str, path: &Path, line: usize) -> Result<TaskRecord, DbError> {
    let Some((task, months)) = record.split_once('\t') else {
        return Err(corrupt(path, line, "expected 2 tab-separated fields"));
    };

    let months: BTreeSet<YearMonth> = months
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(|m| {
            m.parse::<YearMonth>()
                .map_err(|e| corrupt(path, line, e.to_string()))
        })
        .collect::<Result<_, _>>()?;

    Ok(TaskRecord {
        task: task.to_string(),
        months,
    })
}

fn format_task_record(record: &TaskRecord) -> String {
    let months: Vec<String> = record.months.iter().map(ToString::to_string).collect();
    format!("{}\t{}\n", record.task, months.join(","))
}

/// Flat-file store for log entries.
///
/// See the [module documentation](self) for the file layout.
#[derive(Debug, Clone)]
pub struct Database {
    root: PathBuf,
}

impl Database {
    /// Opens the store rooted at `root`, which must be an existing directory.
    pub fn open(root: &Path) -> Result<Self, DbError> {
        if !root.is_dir() {
            return Err(DbError::MissingRoot(root.to_path_buf()));
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Path of the file holding the entries started in `month`.
    pub fn month_path(&self, month: YearMonth) -> PathBuf {
        self.root
            .join(format!("{:04}", month.year()))
            .join(format!("{:02}", month.month()))
    }

    fn current_path(&self) -> PathBuf {
        self.root.join(CURRENT_FILE)
    }

    fn tasks_path(&self) -> PathBuf {
        self.root.join(TASKS_FILE)
    }

    // ========== Open entry ==========

    /// Records that work on `task` started at `started`.
    ///
    /// Replaces any entry already in progress.
    pub fn set_open(&self, started: NaiveDateTime, task: &str) -> Result<OpenEntry, DbError> {
        let entry = OpenEntry::new(started, task);
        let path = self.current_path();
        write_atomic(
            &path,
            &format!("{}\t{}\n", entry.started.format(TIMESTAMP_FORMAT), entry.task),
        )?;
        tracing::debug!(started = %entry.started, task = %entry.task, "wrote open entry");
        Ok(entry)
    }

    /// Returns the entry in progress, if any. With `consume` the entry is
    /// removed from the store as well.
    pub fn get_open(&self, consume: bool) -> Result<Option<OpenEntry>, DbError> {
        let path = self.current_path();
        let Some(content) = read_optional(&path)? else {
            return Ok(None);
        };

        let mut lines = records(&content);
        let Some((line, record)) = lines.next() else {
            return Ok(None);
        };
        if let Some((extra, _)) = lines.next() {
            return Err(corrupt(&path, extra, "more than one entry in progress"));
        }

        let Some((started, task)) = record.split_once('\t') else {
            return Err(corrupt(&path, line, "expected 2 tab-separated fields"));
        };
        let entry = OpenEntry::new(parse_timestamp(started, &path, line)?, task);

        if consume {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(io_error(&path)(e)),
            }
            tracing::debug!(started = %entry.started, "consumed open entry");
        }

        Ok(Some(entry))
    }

    // ========== Closed entries ==========

    /// Stores a finished entry in the file of the month it started in.
    ///
    /// With `sorted` the whole month is re-sorted by start time, which is
    /// needed for entries added after the fact. Otherwise the entry goes at
    /// the end. Overlaps with existing entries are not checked.
    pub fn append_closed(&self, entry: &ClosedEntry, sorted: bool) -> Result<(), DbError> {
        let month = entry.partition();
        let path = self.month_path(month);

        let content = if sorted {
            let mut entries = self.query_month(month)?;
            entries.push(entry.clone());
            entries.sort_by_key(|e| e.start);
            entries.iter().map(format_closed).collect()
        } else {
            let mut content = read_optional(&path)?.unwrap_or_default();
            if !content.is_empty() && !content.ends_with('\n') {
                content.push('\n');
            }
            content.push_str(&format_closed(entry));
            content
        };

        write_atomic(&path, &content)?;
        tracing::debug!(path = %path.display(), sorted, "stored entry");
        Ok(())
    }

    /// Stores several finished entries with sorted inserts and notes their
    /// tasks in the task index.
    ///
    /// Every affected month and the index are read and checked before the
    /// first write, so a corrupt file leaves the store untouched. Each file
    /// is written at most once.
    pub fn insert_closed(&self, entries: &[ClosedEntry]) -> Result<(), DbError> {
        let mut by_month: BTreeMap<YearMonth, Vec<ClosedEntry>> = BTreeMap::new();
        for entry in entries {
            by_month.entry(entry.partition()).or_default().push(entry.clone());
        }

        let mut rewrites = Vec::with_capacity(by_month.len());
        for (month, added) in by_month {
            let mut merged = self.query_month(month)?;
            merged.extend(added);
            merged.sort_by_key(|e| e.start);
            let content: String = merged.iter().map(format_closed).collect();
            rewrites.push((self.month_path(month), content));
        }

        let tasks = entries
            .iter()
            .filter(|e| !e.task.is_empty())
            .map(|e| Ok((TaskName::new(&e.task)?, e.partition())))
            .collect::<Result<Vec<_>, DbError>>()?;
        if let Some(index) = self.updated_task_index(&tasks)? {
            write_atomic(&self.tasks_path(), &index)?;
        }

        for (path, content) in &rewrites {
            write_atomic(path, content)?;
            tracing::debug!(path = %path.display(), "rewrote month");
        }
        Ok(())
    }

    /// Returns the entries started in `month`, ordered by start time.
    pub fn query_month(&self, month: YearMonth) -> Result<Vec<ClosedEntry>, DbError> {
        let path = self.month_path(month);
        let Some(content) = read_optional(&path)? else {
            return Ok(Vec::new());
        };

        let mut entries = records(&content)
            .map(|(line, record)| parse_closed(record, &path, line))
            .collect::<Result<Vec<_>, _>>()?;
        entries.sort_by_key(|e| e.start);
        Ok(entries)
    }

    /// Returns the entries started on `date`.
    pub fn query_day(&self, date: NaiveDate) -> Result<Vec<ClosedEntry>, DbError> {
        let mut entries = self.query_month(YearMonth::of(date))?;
        entries.retain(|e| e.starts_on(date));
        Ok(entries)
    }

    /// Returns the entries started in `year`.
    pub fn query_year(&self, year: i32) -> Result<Vec<ClosedEntry>, DbError> {
        let mut entries = Vec::new();
        for month in 1..=12 {
            if let Some(month) = YearMonth::new(year, month) {
                entries.extend(self.query_month(month)?);
            }
        }
        Ok(entries)
    }

    /// Returns the entries started between `first` and `last`, inclusive.
    pub fn query_span(
        &self,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<Vec<ClosedEntry>, DbError> {
        let (first, last) = if first <= last { (first, last) } else { (last, first) };

        let mut entries = Vec::new();
        for month in YearMonth::of(first).through(YearMonth::of(last)) {
            let mut month_entries = self.query_month(month)?;
            month_entries.retain(|e| (first..=last).contains(&e.start.date()));
            entries.extend(month_entries);
        }
        Ok(entries)
    }

    // ========== Task index ==========

    fn read_task_index(&self) -> Result<Vec<TaskRecord>, DbError> {
        let path = self.tasks_path();
        let Some(content) = read_optional(&path)? else {
            return Ok(Vec::new());
        };
        records(&content)
            .map(|(line, record)| parse_task_record(record, &path, line))
            .collect()
    }

    /// Returns the index of the only record of `task`, if any.
    fn find_task(&self, index: &[TaskRecord], task: &TaskName) -> Result<Option<usize>, DbError> {
        let mut positions = index
            .iter()
            .enumerate()
            .filter(|(_, record)| record.task == task.as_str())
            .map(|(position, _)| position);

        let found = positions.next();
        if positions.next().is_some() {
            return Err(DbError::DuplicateTask {
                path: self.tasks_path(),
                task: task.to_string(),
            });
        }
        Ok(found)
    }

    /// Returns the new content of the task index with `additions` applied,
    /// or `None` if they are all recorded already.
    fn updated_task_index(
        &self,
        additions: &[(TaskName, YearMonth)],
    ) -> Result<Option<String>, DbError> {
        let mut index = self.read_task_index()?;
        let mut changed = false;

        for (task, month) in additions {
            match self.find_task(&index, task)? {
                Some(position) => changed |= index[position].months.insert(*month),
                None => {
                    index.push(TaskRecord {
                        task: task.to_string(),
                        months: BTreeSet::from([*month]),
                    });
                    changed = true;
                }
            }
        }

        Ok(changed.then(|| index.iter().map(format_task_record).collect()))
    }

    /// Notes in the task index that `task` has entries in `month`.
    ///
    /// Recording the same month twice has no further effect.
    pub fn record_task_month(&self, task: &str, month: YearMonth) -> Result<(), DbError> {
        let task = TaskName::new(task)?;
        if let Some(index) = self.updated_task_index(&[(task.clone(), month)])? {
            write_atomic(&self.tasks_path(), &index)?;
            tracing::debug!(%task, %month, "updated task index");
        }
        Ok(())
    }

    /// Returns the months in which `task` has entries.
    pub fn query_task_months(&self, task: &str) -> Result<BTreeSet<YearMonth>, DbError> {
        let task = TaskName::new(task)?;
        let mut index = self.read_task_index()?;
        Ok(self
            .find_task(&index, &task)?
            .map(|position| std::mem::take(&mut index[position].months))
            .unwrap_or_default())
    }
}
