//! Stats command: totals and completion for the selected issues.

use std::fmt::Write;

use anyhow::Result;
use chrono::Local;
use serde::Serialize;
use wl_core::{DateRange, IssueRecord, WorkloadStatistics, compute_statistics, round_hours};
use wl_db::Database;

use super::util::{Align, heading, render_table, select_issues};
use crate::SelectionArgs;

/// Statistics for one group and window.
#[derive(Debug, Serialize)]
pub struct StatsData {
    pub group: String,
    pub window: DateRange,
    #[serde(flatten)]
    pub statistics: WorkloadStatistics,
}

pub fn generate_stats_data(group: &str, window: DateRange, issues: Vec<IssueRecord>) -> StatsData {
    StatsData {
        group: group.to_string(),
        window,
        statistics: compute_statistics(issues),
    }
}

/// Formats statistics as human-readable text.
pub fn format_stats(data: &StatsData) -> String {
    let stats = &data.statistics;
    let mut output = String::new();
    let title = format!("STATISTICS: {}, {}", data.group, data.window);
    writeln!(output, "{}", heading(&title)).unwrap();
    writeln!(output).unwrap();

    let summary = vec![
        vec![
            "Issues:".to_string(),
            format!(
                "{} ({} closed, {} open)",
                stats.total_issues, stats.closed_issues, stats.open_issues
            ),
        ],
        vec![
            "Completion:".to_string(),
            format!("{:.1}%", stats.completion_rate),
        ],
        vec![
            "Estimated hours:".to_string(),
            stats.total_estimated_hours.to_string(),
        ],
        vec![
            "Avg hours/day:".to_string(),
            stats.avg_hours_per_day.to_string(),
        ],
    ];
    for line in render_table(&summary, &[]) {
        writeln!(output, "{line}").unwrap();
    }

    writeln!(output).unwrap();
    if stats.issues.is_empty() {
        writeln!(output, "No issues found in this window.").unwrap();
        return output;
    }

    writeln!(output, "{}", heading("ISSUES")).unwrap();
    let mut rows = vec![
        ["Issue", "Person", "Project", "Start", "Due", "Est.", "Status", "Subject"]
            .map(str::to_string)
            .to_vec(),
    ];
    rows.extend(stats.issues.iter().map(|issue| {
        vec![
            format!("#{}", issue.issue_id),
            issue.person.clone(),
            issue.project.clone(),
            issue.start_date.to_string(),
            issue.due_date.to_string(),
            round_hours(issue.estimated_hours).to_string(),
            issue.status.clone(),
            issue.subject.clone(),
        ]
    }));
    let align = [
        Align::Left,
        Align::Left,
        Align::Left,
        Align::Left,
        Align::Left,
        Align::Right,
    ];
    for line in render_table(&rows, &align) {
        writeln!(output, "{line}").unwrap();
    }

    output
}

/// Formats statistics as JSON.
pub fn format_stats_json(data: &StatsData) -> Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

/// Runs the stats command.
pub fn run(db: &Database, selection: &SelectionArgs, json: bool) -> Result<()> {
    let today = Local::now().date_naive();
    let (window, issues) = select_issues(db, selection, today, true)?;
    let data = generate_stats_data(selection.group.trim(), window, issues);

    if json {
        println!("{}", format_stats_json(&data)?);
    } else {
        print!("{}", format_stats(&data));
    }
    Ok(())
}
