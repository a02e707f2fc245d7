//! The start, stop and switch commands.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDateTime;
use thiserror::Error;

use stl_db::Database;

/// A command that does not fit whether work is in progress.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StateConflict {
    #[error("you are already working on something")]
    AlreadyStarted,

    #[error("you are not working on anything")]
    NotStarted,
}

pub fn start<W: Write>(writer: &mut W, db: &Database, now: NaiveDateTime, task: &str) -> Result<()> {
    if db.get_open(false)?.is_some() {
        return Err(StateConflict::AlreadyStarted.into());
    }

    let open = db.set_open(now, task)?;
    tracing::info!(task = %open.task, started = %open.started, "started");

    if open.task.is_empty() {
        writeln!(writer, "started")?;
    } else {
        writeln!(writer, "started on {}", open.task)?;
    }
    Ok(())
}

/// Stores the entry in progress as finished at `now`.
///
/// The task index is updated before the entry is stored, so a failed update
/// stores nothing. The open entry is only removed once the finished one has
/// been stored.
pub fn stop<W: Write>(writer: &mut W, db: &Database, now: NaiveDateTime) -> Result<()> {
    let open = db.get_open(false)?.ok_or(StateConflict::NotStarted)?;
    let closed = open.close(now)?;

    if !closed.task.is_empty() {
        db.record_task_month(&closed.task, closed.partition())?;
    }
    db.append_closed(&closed, false)?;
    db.get_open(true)?;
    tracing::info!(task = %closed.task, stopped = %closed.stop, "stopped");

    if closed.task.is_empty() {
        writeln!(writer, "stopped")?;
    } else {
        writeln!(writer, "stopped with {}", closed.task)?;
    }
    Ok(())
}

pub fn switch<W: Write>(
    writer: &mut W,
    db: &Database,
    now: NaiveDateTime,
    task: &str,
) -> Result<()> {
    stop(writer, db, now)?;
    start(writer, db, now, task)
}
