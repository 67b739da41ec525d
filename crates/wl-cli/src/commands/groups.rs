//! Groups command: lists the groups known to the database.

use std::fmt::Write;

use anyhow::Result;
use wl_db::Database;

/// Formats the group list, one name per line.
pub fn format_groups(groups: &[String]) -> String {
    let mut output = String::new();
    if groups.is_empty() {
        writeln!(output, "No groups found.").unwrap();
        writeln!(output, "Hint: Run 'wl import' to load issue records.").unwrap();
        return output;
    }
    for group in groups {
        writeln!(output, "{group}").unwrap();
    }
    output
}

/// Runs the groups command.
pub fn run(db: &Database) -> Result<()> {
    let groups = db.list_groups()?;
    print!("{}", format_groups(&groups));
    Ok(())
}
