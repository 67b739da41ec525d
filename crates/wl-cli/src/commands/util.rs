//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;
use wl_core::{DateRange, IssueRecord};
use wl_db::{Database, IssueQuery};

use crate::SelectionArgs;

/// Pre-compiled regex for relative date parsing.
static RELATIVE_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:in\s+(?P<ahead>\d+)\s+(?P<ahead_unit>day|week)s?|(?P<ago>\d+)\s+(?P<ago_unit>day|week)s?\s+ago)$",
    )
    .unwrap()
});

/// Bound on relative offsets (~1000 years in days).
const MAX_RELATIVE_DAYS: i64 = 1000 * 365;

/// Parse a date as `YYYY-MM-DD`, `today`, or a relative offset from `today`.
///
/// Relative forms: "3 days ago", "1 week ago", "in 2 weeks", "in 10 days".
pub fn parse_date(s: &str, today: NaiveDate) -> Result<NaiveDate> {
    let s = s.trim().to_ascii_lowercase();
    if s == "today" {
        return Ok(today);
    }
    if let Ok(date) = NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
        return Ok(date);
    }

    let Some(caps) = RELATIVE_DATE_RE.captures(&s) else {
        anyhow::bail!(
            "Invalid date: {s}. Use YYYY-MM-DD, 'today', or relative (e.g., '3 days ago', 'in 2 weeks')"
        );
    };

    let (n, unit, sign) = match caps.name("ahead") {
        Some(n) => (n.as_str(), &caps["ahead_unit"], 1),
        None => (&caps["ago"], &caps["ago_unit"], -1),
    };
    let n: i64 = n.parse().context("failed to parse number in relative date")?;

    let days_per_unit = match unit {
        "day" => 1,
        "week" => 7,
        unit => anyhow::bail!("Unknown date unit: {unit}"),
    };
    if n > MAX_RELATIVE_DAYS / days_per_unit {
        anyhow::bail!("Relative date value too large: {n} {unit}");
    }

    today
        .checked_add_signed(Duration::days(sign * n * days_per_unit))
        .with_context(|| format!("date out of range: {s}"))
}

/// December 31 of `today`'s year.
pub fn end_of_year(today: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today)
}

/// Resolves `--start`/`--end` into a window.
///
/// Defaults to today through December 31 of the current year.
pub fn resolve_window(start: Option<&str>, end: Option<&str>, today: NaiveDate) -> Result<DateRange> {
    let start = start
        .map(|s| parse_date(s, today))
        .transpose()
        .context("invalid --start")?
        .unwrap_or(today);
    let end = end
        .map(|s| parse_date(s, today))
        .transpose()
        .context("invalid --end")?
        .unwrap_or_else(|| end_of_year(today));

    DateRange::new(start, end).context("--start must not be after --end")
}

/// Trims person names and drops blank entries.
pub fn normalize_people(people: &[String]) -> Vec<String> {
    people
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Fetches the issues a selection covers, with the resolved window.
///
/// `closed_first` lists closed issues ahead of open ones within a project.
pub fn select_issues(
    db: &Database,
    selection: &SelectionArgs,
    today: NaiveDate,
    closed_first: bool,
) -> Result<(DateRange, Vec<IssueRecord>)> {
    let window = resolve_window(selection.start.as_deref(), selection.end.as_deref(), today)?;
    let query = IssueQuery {
        group: selection.group.trim().to_string(),
        people: normalize_people(&selection.people),
        window,
        closed_first,
    };
    let issues = db
        .fetch_issues(&query)
        .with_context(|| format!("failed to fetch issues for group {}", query.group))?;
    tracing::debug!(group = %query.group, %window, issues = issues.len(), "selected issues");
    Ok((window, issues))
}

/// Column alignment for [`render_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// Lays out rows as space-separated columns, without trailing whitespace.
///
/// `align` gives each column's alignment; missing entries default to left.
pub fn render_table(rows: &[Vec<String>], align: &[Align]) -> Vec<String> {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|col| {
            rows.iter()
                .filter_map(|row| row.get(col))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    rows.iter()
        .map(|row| {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(col, (cell, &width))| match align.get(col) {
                    Some(Align::Right) => format!("{cell:>width$}"),
                    _ => format!("{cell:<width$}"),
                })
                .collect();
            cells.join("  ").trim_end().to_string()
        })
        .collect()
}

/// A heading followed by a rule of the same width.
pub fn heading(title: &str) -> String {
    format!("{title}\n{}", "─".repeat(title.chars().count()))
}
