//! Simple time logger CLI library.
//!
//! This crate provides the CLI interface for stl.

mod cli;
pub mod commands;
mod config;
pub mod spawn;

pub use cli::{Cli, Commands, NOW_FORMAT};
pub use commands::track::StateConflict;
pub use config::{Config, resolve_root};
pub use spawn::SpawnError;
