//! Opening a month of logs in an editor.

use anyhow::{Result, bail};

use stl_core::Parser;
use stl_core::pretty::format_month;
use stl_db::Database;

use crate::spawn;

/// Opens the log file of the month described by `month` and waits for the
/// editor to exit.
pub fn run(db: &Database, parser: &Parser, month: &str, editor: Option<&str>) -> Result<()> {
    let month = parser.extract_month(month)?;
    let path = db.month_path(month);
    if !path.is_file() {
        bail!("there are no logs for {}", format_month(month));
    }

    spawn::edit(&path, editor)?;
    Ok(())
}
