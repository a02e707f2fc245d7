//! Import command for harvesting entries from foreign log files.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use stl_core::{ClosedEntry, ScanDefaults, Scanner};
use stl_db::Database;

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Regular expression matching the lines to import.
    ///
    /// May use %Y %y %m %b %B %d %H %M %S, first for the start and again for
    /// the stop, and a (?P<task>...) group.
    pub pattern: String,

    /// Files to scan.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Year to assume when the pattern has none.
    #[arg(long)]
    pub year: Option<i32>,

    /// Month to assume when the pattern has none.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,

    /// Day to assume when the pattern has none.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=31))]
    pub day: Option<u32>,
}

/// Scans every file, then stores what was found.
///
/// Nothing is stored if any file fails to scan, or if any month file or the
/// task index the entries would land in cannot be read.
pub fn run<W: Write>(writer: &mut W, db: &Database, args: &ImportArgs) -> Result<usize> {
    let defaults = ScanDefaults {
        year: args.year,
        month: args.month,
        day: args.day,
    };
    let scanner = Scanner::new(&args.pattern, defaults).context("invalid import pattern")?;

    let mut entries: Vec<ClosedEntry> = Vec::new();
    for path in &args.files {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let found = scanner
            .scan_str(&text)
            .with_context(|| format!("failed to scan {}", path.display()))?;
        tracing::debug!(path = %path.display(), entries = found.len(), "scanned");
        entries.extend(found);
    }

    db.insert_closed(&entries)?;

    writeln!(writer, "imported {} entries", entries.len())?;
    Ok(entries.len())
}
