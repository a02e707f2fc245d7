//! Logging work after the fact.

use std::io::Write;

use anyhow::Result;

use stl_core::pretty::format_datetime;
use stl_core::{ClosedEntry, Parser};
use stl_db::Database;

/// Stores the work done on `task` between `start` and `stop`.
///
/// Overlaps with already logged work are not checked.
pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    parser: &Parser,
    start: &str,
    stop: &str,
    task: &str,
) -> Result<()> {
    let start = parser.extract_datetime(start)?;
    let stop = parser.extract_datetime(stop)?;
    let entry = ClosedEntry::new(start, stop, task)?;

    db.append_closed(&entry, true)?;
    if !entry.task.is_empty() {
        db.record_task_month(&entry.task, entry.partition())?;
    }
    tracing::info!(task = %entry.task, start = %entry.start, stop = %entry.stop, "added");

    if entry.task.is_empty() {
        writeln!(writer, "added")?;
    } else {
        writeln!(writer, "added task {}", entry.task)?;
    }
    writeln!(writer, "start: {}", format_datetime(entry.start))?;
    writeln!(writer, "stop: {}", format_datetime(entry.stop))?;
    Ok(())
}
