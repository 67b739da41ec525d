//! Import command for loading issue records into the local `SQLite` store.

use std::io::{self, BufRead};

use anyhow::{Context, Result};
use wl_db::{Database, IssueImport};

/// Reads JSONL issue records from stdin and writes them to the database.
pub fn run(db: &mut Database) -> Result<usize> {
    let stdin = io::stdin();
    let records = parse_records(stdin.lock())?;
    let written = db
        .import_issues(&records)
        .context("failed to import issue records")?;
    eprintln!("Imported {written} issues");
    Ok(written)
}

fn parse_records<R: BufRead>(reader: R) -> Result<Vec<IssueImport>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record: IssueImport = serde_json::from_str(trimmed)
            .with_context(|| format!("invalid issue record on line {}", idx + 1))?;
        records.push(record);
    }
    tracing::debug!(records = records.len(), "parsed issue records");
    Ok(records)
}
