//! CLI subcommand implementations.

pub mod groups;
pub mod import;
pub mod people;
pub mod report;
pub mod stats;
pub mod util;
