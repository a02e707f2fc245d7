//! Core domain logic for the stl time logger.
//!
//! This crate contains the I/O-free parts of the logger:
//! - Time expressions: turning "15 oct", "last" or "10 sep 12 oct" into dates
//! - Pretty-printing of dates and durations, readable back by the parser
//! - Entries and the validation of task names and intervals
//! - Status summaries over logged entries
//! - Scanning foreign log files for entries

mod entry;
pub mod pretty;
pub mod scan;
pub mod status;
mod time;
mod types;

pub use entry::{ClosedEntry, OpenEntry, truncate_to_minute};
pub use scan::{ScanDefaults, ScanError, Scanner};
pub use time::{Expression, ParseError, Parser};
pub use types::{TaskName, ValidationError, YearMonth, sanitize_text};
