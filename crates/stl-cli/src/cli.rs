//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};

use crate::commands::import::ImportArgs;
use crate::commands::status::StatusArgs;

/// Format accepted by the hidden `--now` flag.
pub const NOW_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Simple time logger.
///
/// Logs the time spent on tasks into plain text files and reports on it.
#[derive(Debug, Parser)]
#[command(name = "stl", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Existing directory to keep the logs in.
    #[arg(long, global = true, value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// Pretend that the current time is the given one (YYYY-MM-DDTHH:MM).
    #[arg(long, global = true, hide = true, value_parser = parse_now)]
    pub now: Option<NaiveDateTime>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

fn parse_now(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, NOW_FORMAT).map_err(|e| format!("{e} (expected {NOW_FORMAT})"))
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start working on a task.
    Start {
        /// The task you are about to work on.
        task: Option<String>,
    },

    /// Stop working on the current task.
    Stop,

    /// Stop the current task and start another one.
    Switch {
        /// The task you are about to work on.
        task: Option<String>,
    },

    /// Log a finished stretch of work after the fact.
    Add {
        /// When the work started (YYYY-MM-DDTHH:MM).
        start: String,

        /// When the work stopped (YYYY-MM-DDTHH:MM).
        stop: String,

        /// The task worked on.
        task: Option<String>,
    },

    /// Show the current task, or a summary of a period or task.
    #[command(visible_alias = "show")]
    Status(StatusArgs),

    /// Open the logs of a month in your editor.
    Edit {
        /// The month to edit, e.g. "oct", "10 2016" or "last".
        month: Vec<String>,
    },

    /// Harvest log entries from other text files.
    Import(ImportArgs),
}
