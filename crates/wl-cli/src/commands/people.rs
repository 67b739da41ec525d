//! People command: lists the active members of a group.

use std::fmt::Write;

use anyhow::{Context, Result};
use wl_db::Database;

/// Formats a group's member list.
pub fn format_people(group: &str, people: &[String]) -> String {
    let mut output = String::new();
    if people.is_empty() {
        writeln!(output, "No active members in {group}.").unwrap();
        writeln!(output, "Hint: Run 'wl groups' to list group names.").unwrap();
        return output;
    }
    for person in people {
        writeln!(output, "{person}").unwrap();
    }
    output
}

/// Runs the people command.
pub fn run(db: &Database, group: &str) -> Result<()> {
    let group = group.trim();
    let people = db
        .list_people(group)
        .with_context(|| format!("failed to list members of {group}"))?;
    print!("{}", format_people(group, &people));
    Ok(())
}
