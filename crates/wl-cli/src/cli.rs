//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use wl_core::Granularity;

/// Workload distribution reports.
///
/// Spreads each issue's estimated hours over the work days between its start
/// and due dates, then rolls the result up per project and per person.
#[derive(Debug, Parser)]
#[command(name = "wl", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Which issues a report covers.
#[derive(Debug, Clone, Args)]
pub struct SelectionArgs {
    /// Group whose members' issues are included.
    #[arg(short, long)]
    pub group: String,

    /// Restrict to a person by full name. Repeat for several people.
    #[arg(short, long = "person", value_name = "NAME")]
    pub people: Vec<String>,

    /// First day of the window: YYYY-MM-DD, "today", "3 days ago" or "in 2 weeks".
    /// Defaults to today.
    #[arg(long, value_name = "DATE")]
    pub start: Option<String>,

    /// Last day of the window, same formats as --start.
    /// Defaults to December 31 of the current year.
    #[arg(long, value_name = "DATE")]
    pub end: Option<String>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List groups.
    Groups,

    /// List active members of a group.
    People {
        /// Group name.
        group: String,
    },

    /// Show how estimated hours are distributed over the window.
    Report {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Bucket size: daily, weekly or monthly. Defaults to the configured value.
        #[arg(long)]
        granularity: Option<Granularity>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show totals and completion for the selected issues.
    Stats {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Import issue records (JSONL) from stdin.
    Import,
}
