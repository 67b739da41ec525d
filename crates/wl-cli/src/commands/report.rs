//! Report command for workload distribution grids.
//!
//! This module implements `wl report`: one row per person, project and issue,
//! one column per day, week or month of the window, in human-readable or
//! JSON form.

use std::fmt::Write;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use wl_core::{
    AnalysisNode, DateRange, Granularity, IssueRecord, NodeKind, Period, compute_distribution,
    periods, round_hours, zero_hours,
};
use wl_db::Database;

use super::util::{Align, heading, render_table, select_issues};
use crate::SelectionArgs;

/// Computed report data.
#[derive(Debug)]
pub struct ReportData {
    pub group: String,
    pub window: DateRange,
    pub granularity: Granularity,
    pub nodes: Vec<AnalysisNode>,
}

/// Distributes `issues` over `window` for one group.
pub fn generate_report_data(
    group: &str,
    issues: &[IssueRecord],
    window: DateRange,
    granularity: Granularity,
) -> ReportData {
    ReportData {
        group: group.to_string(),
        window,
        granularity,
        nodes: compute_distribution(issues, window, granularity),
    }
}

// ========== Text Output ==========

#[derive(Debug, Clone, Copy)]
enum Column {
    Day(NaiveDate),
    Bucket(Period),
}

impl Column {
    fn header(self) -> String {
        match self {
            Self::Day(date) => date.format("%m-%d").to_string(),
            Self::Bucket(period) => period.label(),
        }
    }

    fn hours(self, node: &AnalysisNode) -> Option<Decimal> {
        match self {
            Self::Day(date) => node.series.hours_on(date),
            Self::Bucket(period) => node.series.hours_in(period.key),
        }
    }
}

fn columns(window: DateRange, granularity: Granularity) -> Vec<Column> {
    match granularity {
        Granularity::Daily => window.days().map(Column::Day).collect(),
        Granularity::Weekly | Granularity::Monthly => periods(window, granularity)
            .into_iter()
            .map(Column::Bucket)
            .collect(),
    }
}

fn row_label(node: &AnalysisNode) -> String {
    if let Some(id) = node.issue_id() {
        return format!("    #{id} {}", node.subject);
    }
    match node.project.as_deref() {
        Some(project) => format!("  {project}"),
        None => node.person.clone(),
    }
}

fn hours_cell(hours: Option<Decimal>) -> String {
    match hours {
        Some(h) if !h.is_zero() => h.to_string(),
        _ => "-".to_string(),
    }
}

/// Formats report data as a human-readable grid.
pub fn format_report(data: &ReportData) -> String {
    let mut output = String::new();
    let title = format!(
        "WORKLOAD: {}, {} ({})",
        data.group, data.window, data.granularity
    );
    writeln!(output, "{}", heading(&title)).unwrap();

    if data.nodes.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "No issues found in this window.").unwrap();
        writeln!(
            output,
            "Hint: Run 'wl people {}' to check the group's members.",
            data.group
        )
        .unwrap();
        return output;
    }

    let columns = columns(data.window, data.granularity);
    let mut rows = Vec::with_capacity(data.nodes.len() + 1);
    let mut header = vec![String::new(), "Est.".to_string()];
    header.extend(columns.iter().map(|c| c.header()));
    header.push("Total".to_string());
    rows.push(header);

    for node in &data.nodes {
        let mut row = vec![row_label(node), round_hours(node.estimated_hours).to_string()];
        row.extend(columns.iter().map(|c| hours_cell(c.hours(node))));
        row.push(node.series.total_hours().to_string());
        rows.push(row);
    }

    let mut align = vec![Align::Left];
    align.resize(columns.len() + 3, Align::Right);

    writeln!(output).unwrap();
    for line in render_table(&rows, &align) {
        writeln!(output, "{line}").unwrap();
    }

    let total = data
        .nodes
        .iter()
        .filter(|n| n.kind == NodeKind::PersonSummary)
        .fold(zero_hours(), |acc, n| acc + n.series.total_hours());
    let issue_count = data.nodes.iter().filter(|n| !n.is_summary()).count();
    let noun = if issue_count == 1 { "issue" } else { "issues" };
    writeln!(output).unwrap();
    writeln!(
        output,
        "Window total: {total} hours across {issue_count} {noun}"
    )
    .unwrap();

    output
}

// ========== JSON Output ==========

#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub group: &'a str,
    pub window: DateRange,
    pub granularity: Granularity,
    pub nodes: &'a [AnalysisNode],
}

/// Formats report data as JSON.
pub fn format_report_json(data: &ReportData) -> Result<String> {
    let report = JsonReport {
        group: &data.group,
        window: data.window,
        granularity: data.granularity,
        nodes: &data.nodes,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

// ========== Public Interface ==========

/// Runs the report command.
pub fn run(
    db: &Database,
    selection: &SelectionArgs,
    granularity: Granularity,
    json: bool,
) -> Result<()> {
    let today = Local::now().date_naive();
    let (window, issues) = select_issues(db, selection, today, false)?;
    let data = generate_report_data(selection.group.trim(), &issues, window, granularity);

    if json {
        let output = format_report_json(&data)?;
        println!("{output}");
    } else {
        let output = format_report(&data);
        print!("{output}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_test_issue(
        id: i64,
        person: &str,
        project: &str,
        subject: &str,
        (start, due): (NaiveDate, NaiveDate),
        hours: Decimal,
    ) -> IssueRecord {
        IssueRecord {
            group: "Platform".to_string(),
            person: person.to_string(),
            project: project.to_string(),
            issue_id: id,
            subject: subject.to_string(),
            start_date: start,
            due_date: due,
            estimated_hours: hours,
            status: "New".to_string(),
            is_closed: false,
            closed_on: None,
        }
    }

    fn work_week() -> DateRange {
        DateRange::new(date(2025, 3, 3), date(2025, 3, 7)).unwrap()
    }

    fn team_issues() -> Vec<IssueRecord> {
        vec![
            make_test_issue(
                1,
                "ChenWei",
                "Apollo",
                "Design review",
                (date(2025, 3, 3), date(2025, 3, 7)),
                dec!(10),
            ),
            make_test_issue(
                2,
                "ChenWei",
                "Borealis",
                "Load tests",
                (date(2025, 3, 5), date(2025, 3, 6)),
                dec!(3),
            ),
            make_test_issue(
                3,
                "LinMei",
                "Apollo",
                "Docs",
                (date(2025, 3, 6), date(2025, 3, 12)),
                dec!(7.5),
            ),
        ]
    }

    #[test]
    fn test_report_daily_grid() {
        let data = generate_report_data("Platform", &team_issues(), work_week(), Granularity::Daily);
        let output = format_report(&data);
        assert_snapshot!(output, @r"
WORKLOAD: Platform, 2025-03-03 to 2025-03-07 (daily)
────────────────────────────────────────────────────

                       Est.  03-03  03-04  03-05  03-06  03-07  Total
ChenWei               13.00   2.00   2.00   3.50   3.50   2.00  13.00
  Apollo              10.00   2.00   2.00   2.00   2.00   2.00  10.00
    #1 Design review  10.00   2.00   2.00   2.00   2.00   2.00  10.00
  Borealis             3.00      -      -   1.50   1.50      -   3.00
    #2 Load tests      3.00      -      -   1.50   1.50      -   3.00
LinMei                 7.50      -      -      -   1.50   1.50   3.00
  Apollo               7.50      -      -      -   1.50   1.50   3.00
    #3 Docs            7.50      -      -      -   1.50   1.50   3.00

Window total: 16.00 hours across 3 issues
");
    }

    #[test]
    fn test_report_weekly_grid() {
        let issues = vec![make_test_issue(
            7,
            "ChenWei",
            "Apollo",
            "Migration",
            (date(2025, 2, 20), date(2025, 3, 10)),
            dec!(15),
        )];
        let window = DateRange::new(date(2025, 2, 26), date(2025, 3, 11)).unwrap();
        let data = generate_report_data("Platform", &issues, window, Granularity::Weekly);
        let output = format_report(&data);
        assert_snapshot!(output, @r"
WORKLOAD: Platform, 2025-02-26 to 2025-03-11 (weekly)
─────────────────────────────────────────────────────

                   Est.  2025-W09 (Feb~Mar)  2025-W10 (Mar)  2025-W11 (Mar)  Total
ChenWei           15.00                3.45            5.75            1.15  10.35
  Apollo          15.00                3.45            5.75            1.15  10.35
    #7 Migration  15.00                3.45            5.75            1.15  10.35

Window total: 10.35 hours across 1 issue
");
    }

    #[test]
    fn test_report_empty_window() {
        let data = generate_report_data("Platform", &[], work_week(), Granularity::Monthly);
        let output = format_report(&data);
        assert_snapshot!(output, @r"
WORKLOAD: Platform, 2025-03-03 to 2025-03-07 (monthly)
──────────────────────────────────────────────────────

No issues found in this window.
Hint: Run 'wl people Platform' to check the group's members.
");
    }

    #[test]
    fn test_report_json_output() {
        let data = generate_report_data("Platform", &team_issues(), work_week(), Granularity::Monthly);
        let output = format_report_json(&data).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(json["group"], "Platform");
        assert_eq!(json["granularity"], "monthly");
        assert_eq!(json["window"]["start"], "2025-03-03");
        assert_eq!(json["window"]["end"], "2025-03-07");

        let nodes = json["nodes"].as_array().unwrap();
        assert_eq!(nodes.len(), 8);
        assert_eq!(nodes[0]["level"], "person_summary");
        assert_eq!(nodes[0]["subject"], "total: 13 hours");
        assert_eq!(nodes[1]["level"], "project_summary");
        assert_eq!(nodes[2]["level"], "issue");
        assert_eq!(nodes[2]["id"], 1);

        let buckets = nodes[0]["series"]["periodic"].as_array().unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0]["period"], "2025-03");
        assert_eq!(buckets[0]["hours"], "13.00");
    }
}
