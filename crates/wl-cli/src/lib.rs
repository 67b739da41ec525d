//! Workload report CLI library.
//!
//! This crate provides the CLI interface for workload distribution reports.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, SelectionArgs};
pub use config::Config;
