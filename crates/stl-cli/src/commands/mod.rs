//! CLI subcommand implementations.

pub mod add;
pub mod edit;
pub mod import;
pub mod status;
pub mod track;
