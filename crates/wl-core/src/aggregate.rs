//! Three-level workload rollups: issue, project, person.
//!
//! Output order per person (persons in first-encountered order):
//! person summary, then for each project (first-encountered order) the
//! project summary followed by that project's issues in input order.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::allocation::{DailyAllocation, allocate_daily, total_hours, zero_hours};
use crate::bucket::{PeriodAllocation, rebucket, total_period_hours};
use crate::calendar::{DateRange, PeriodKey, is_weekend};
use crate::types::{Granularity, IssueRecord};

/// Level of an output row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum NodeKind {
    /// Sum over every issue assigned to a person.
    PersonSummary,
    /// Sum over one person's issues in one project.
    ProjectSummary,
    Issue { id: i64 },
}

/// Hours over the query window at the requested granularity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Series {
    /// One entry per window day, zeros included.
    Daily(Vec<DailyAllocation>),
    /// Non-zero weekly or monthly buckets only.
    Periodic(Vec<PeriodAllocation>),
}

impl Series {
    /// Hours allocated inside the window.
    pub fn total_hours(&self) -> Decimal {
        match self {
            Self::Daily(days) => total_hours(days),
            Self::Periodic(buckets) => total_period_hours(buckets),
        }
    }

    pub fn hours_on(&self, date: NaiveDate) -> Option<Decimal> {
        match self {
            Self::Daily(days) => days.iter().find(|d| d.date == date).map(|d| d.hours),
            Self::Periodic(_) => None,
        }
    }

    pub fn hours_in(&self, key: PeriodKey) -> Option<Decimal> {
        match self {
            Self::Daily(_) => None,
            Self::Periodic(buckets) => buckets.iter().find(|b| b.key == key).map(|b| b.hours),
        }
    }
}

/// One row of distribution output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisNode {
    #[serde(flatten)]
    pub kind: NodeKind,
    pub group: String,
    pub person: String,
    /// `None` on person summaries, which span projects.
    pub project: Option<String>,
    /// Issue subject, or the summary label.
    pub subject: String,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    /// Full estimate (not clipped to the window).
    pub estimated_hours: Decimal,
    pub series: Series,
}

impl AnalysisNode {
    pub const fn is_summary(&self) -> bool {
        !matches!(self.kind, NodeKind::Issue { .. })
    }

    pub const fn issue_id(&self) -> Option<i64> {
        match self.kind {
            NodeKind::Issue { id } => Some(id),
            NodeKind::PersonSummary | NodeKind::ProjectSummary => None,
        }
    }
}

struct PersonIssues<'a> {
    name: &'a str,
    group: &'a str,
    projects: Vec<ProjectIssues<'a>>,
}

struct ProjectIssues<'a> {
    name: &'a str,
    group: &'a str,
    issues: Vec<&'a IssueRecord>,
}

fn group_by_person(issues: &[IssueRecord]) -> Vec<PersonIssues<'_>> {
    let mut people: Vec<PersonIssues<'_>> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for issue in issues {
        let slot = *index.entry(issue.person.as_str()).or_insert_with(|| {
            people.push(PersonIssues {
                name: &issue.person,
                group: &issue.group,
                projects: Vec::new(),
            });
            people.len() - 1
        });
        let person = &mut people[slot];
        match person.projects.iter_mut().find(|p| p.name == issue.project) {
            Some(project) => project.issues.push(issue),
            None => person.projects.push(ProjectIssues {
                name: &issue.project,
                group: &issue.group,
                issues: vec![issue],
            }),
        }
    }
    people
}

fn issue_node(issue: &IssueRecord, window: DateRange, granularity: Granularity) -> AnalysisNode {
    let days = allocate_daily(issue, window);
    let series = match granularity {
        Granularity::Daily => Series::Daily(days),
        Granularity::Weekly | Granularity::Monthly => {
            Series::Periodic(rebucket(&days, window, granularity))
        }
    };
    AnalysisNode {
        kind: NodeKind::Issue {
            id: issue.issue_id,
        },
        group: issue.group.clone(),
        person: issue.person.clone(),
        project: Some(issue.project.clone()),
        subject: issue.subject.clone(),
        start_date: Some(issue.start_date),
        due_date: Some(issue.due_date),
        estimated_hours: issue.estimated_hours,
        series,
    }
}

/// Elementwise (daily) or per-key (periodic) sum of the children's series.
fn sum_series(children: &[&AnalysisNode], window: DateRange, granularity: Granularity) -> Series {
    match granularity {
        Granularity::Daily => {
            let mut totals: Vec<DailyAllocation> = window
                .days()
                .map(|date| DailyAllocation {
                    date,
                    hours: zero_hours(),
                    is_weekend: is_weekend(date),
                    in_issue_span: false,
                })
                .collect();
            for child in children {
                if let Series::Daily(days) = &child.series {
                    for (total, day) in totals.iter_mut().zip(days) {
                        total.hours += day.hours;
                        total.in_issue_span |= day.in_issue_span;
                    }
                }
            }
            Series::Daily(totals)
        }
        Granularity::Weekly | Granularity::Monthly => {
            let mut totals: BTreeMap<PeriodKey, PeriodAllocation> = BTreeMap::new();
            for child in children {
                if let Series::Periodic(buckets) = &child.series {
                    for bucket in buckets {
                        totals
                            .entry(bucket.key)
                            .and_modify(|total| total.hours += bucket.hours)
                            .or_insert_with(|| bucket.clone());
                    }
                }
            }
            Series::Periodic(totals.into_values().collect())
        }
    }
}

fn summary_node(
    kind: NodeKind,
    group: &str,
    person: &str,
    project: Option<&str>,
    children: &[&AnalysisNode],
    window: DateRange,
    granularity: Granularity,
) -> AnalysisNode {
    let total: Decimal = children.iter().map(|c| c.estimated_hours).sum();
    let subject = match kind {
        NodeKind::ProjectSummary => format!("project total: {total} hours"),
        _ => format!("total: {total} hours"),
    };
    AnalysisNode {
        kind,
        group: group.to_string(),
        person: person.to_string(),
        project: project.map(str::to_string),
        subject,
        start_date: None,
        due_date: None,
        estimated_hours: total,
        series: sum_series(children, window, granularity),
    }
}

/// Distributes every issue over `window` and rolls the result up per person.
///
/// Issues are grouped by their resolved person name; a group-wide input
/// simply produces one block per assignee.
pub fn compute_distribution(
    issues: &[IssueRecord],
    window: DateRange,
    granularity: Granularity,
) -> Vec<AnalysisNode> {
    let people = group_by_person(issues);
    let mut nodes = Vec::with_capacity(issues.len() * 2 + people.len());

    for person in &people {
        let blocks: Vec<(AnalysisNode, Vec<AnalysisNode>)> = person
            .projects
            .iter()
            .map(|project| {
                let issue_nodes: Vec<AnalysisNode> = project
                    .issues
                    .iter()
                    .map(|issue| issue_node(issue, window, granularity))
                    .collect();
                let children: Vec<&AnalysisNode> = issue_nodes.iter().collect();
                let summary = summary_node(
                    NodeKind::ProjectSummary,
                    project.group,
                    person.name,
                    Some(project.name),
                    &children,
                    window,
                    granularity,
                );
                (summary, issue_nodes)
            })
            .collect();

        let project_summaries: Vec<&AnalysisNode> = blocks.iter().map(|(s, _)| s).collect();
        nodes.push(summary_node(
            NodeKind::PersonSummary,
            person.group,
            person.name,
            None,
            &project_summaries,
            window,
            granularity,
        ));
        for (summary, issue_nodes) in blocks {
            nodes.push(summary);
            nodes.extend(issue_nodes);
        }
    }

    tracing::debug!(
        issues = issues.len(),
        people = people.len(),
        nodes = nodes.len(),
        %granularity,
        %window,
        "computed workload distribution"
    );
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn range(start: NaiveDate, end: NaiveDate) -> DateRange {
        DateRange::new(start, end).unwrap()
    }

    fn issue(
        id: i64,
        person: &str,
        project: &str,
        (start, due): (NaiveDate, NaiveDate),
        hours: Decimal,
    ) -> IssueRecord {
        IssueRecord {
            group: "Platform".to_string(),
            person: person.to_string(),
            project: project.to_string(),
            issue_id: id,
            subject: format!("Issue {id}"),
            start_date: start,
            due_date: due,
            estimated_hours: hours,
            status: "New".to_string(),
            is_closed: false,
            closed_on: None,
        }
    }

    fn march_issues() -> Vec<IssueRecord> {
        let week10 = (date(2025, 3, 3), date(2025, 3, 7));
        let split = (date(2025, 2, 20), date(2025, 3, 10));
        vec![
            issue(1, "ChenWei", "Apollo", week10, dec!(10)),
            issue(4, "LinMei", "Zephyr", week10, dec!(5)),
            issue(2, "ChenWei", "Borealis", split, dec!(15)),
            issue(3, "ChenWei", "Apollo", (date(2025, 3, 5), date(2025, 3, 12)), dec!(7.5)),
        ]
    }

    #[test]
    fn test_empty_input_yields_no_nodes() {
        let window = range(date(2025, 3, 1), date(2025, 3, 31));
        assert!(compute_distribution(&[], window, Granularity::Daily).is_empty());
    }

    #[test]
    fn test_output_order_person_project_issue() {
        let window = range(date(2025, 3, 1), date(2025, 3, 31));
        let nodes = compute_distribution(&march_issues(), window, Granularity::Weekly);

        let shape: Vec<(NodeKind, &str, Option<&str>)> = nodes
            .iter()
            .map(|n| (n.kind, n.person.as_str(), n.project.as_deref()))
            .collect();
        assert_eq!(
            shape,
            vec![
                (NodeKind::PersonSummary, "ChenWei", None),
                (NodeKind::ProjectSummary, "ChenWei", Some("Apollo")),
                (NodeKind::Issue { id: 1 }, "ChenWei", Some("Apollo")),
                (NodeKind::Issue { id: 3 }, "ChenWei", Some("Apollo")),
                (NodeKind::ProjectSummary, "ChenWei", Some("Borealis")),
                (NodeKind::Issue { id: 2 }, "ChenWei", Some("Borealis")),
                (NodeKind::PersonSummary, "LinMei", None),
                (NodeKind::ProjectSummary, "LinMei", Some("Zephyr")),
                (NodeKind::Issue { id: 4 }, "LinMei", Some("Zephyr")),
            ]
        );
    }

    #[test]
    fn test_summary_labels_and_totals() {
        let window = range(date(2025, 3, 1), date(2025, 3, 31));
        let nodes = compute_distribution(&march_issues(), window, Granularity::Daily);

        assert_eq!(nodes[0].subject, "total: 32.5 hours");
        assert_eq!(nodes[0].estimated_hours, dec!(32.5));
        assert_eq!(nodes[1].subject, "project total: 17.5 hours");
        assert_eq!(nodes[4].subject, "project total: 15 hours");
        assert!(nodes[0].is_summary());
        assert_eq!(nodes[0].issue_id(), None);
        assert_eq!(nodes[2].issue_id(), Some(1));
        assert_eq!(nodes[2].subject, "Issue 1");
    }

    #[test]
    fn test_daily_summaries_sum_children_per_day() {
        let window = range(date(2025, 3, 1), date(2025, 3, 31));
        let nodes = compute_distribution(&march_issues(), window, Granularity::Daily);

        let person = &nodes[0];
        let apollo = &nodes[1];
        let apollo_issues = [&nodes[2], &nodes[3]];
        let borealis = &nodes[4];

        for day in window.days() {
            let issues_sum: Decimal = apollo_issues
                .iter()
                .map(|n| n.series.hours_on(day).unwrap())
                .sum();
            assert_eq!(apollo.series.hours_on(day), Some(issues_sum), "{day}");

            let projects_sum =
                apollo.series.hours_on(day).unwrap() + borealis.series.hours_on(day).unwrap();
            assert_eq!(person.series.hours_on(day), Some(projects_sum), "{day}");
        }

        // Mar 5: issue 1 at 2.00, issue 3 at 7.5 / 6 = 1.25, issue 2 at 1.15
        assert_eq!(person.series.hours_on(date(2025, 3, 5)), Some(dec!(4.40)));
        assert_eq!(person.series.hours_on(date(2025, 3, 8)), Some(dec!(0)));
    }

    #[test]
    fn test_daily_summary_span_flag_is_union_of_children() {
        let window = range(date(2025, 3, 1), date(2025, 3, 31));
        let nodes = compute_distribution(&march_issues(), window, Granularity::Daily);
        let Series::Daily(days) = &nodes[0].series else {
            panic!("daily series expected");
        };
        let in_span: Vec<NaiveDate> = days
            .iter()
            .filter(|d| d.in_issue_span)
            .map(|d| d.date)
            .collect();
        assert_eq!(in_span.first(), Some(&date(2025, 3, 1)));
        assert_eq!(in_span.last(), Some(&date(2025, 3, 12)));
        assert_eq!(days.len(), 31);
    }

    #[test]
    fn test_weekly_summaries_sum_children_per_period() {
        let window = range(date(2025, 3, 1), date(2025, 3, 31));
        let nodes = compute_distribution(&march_issues(), window, Granularity::Weekly);

        let person = &nodes[0];
        let Series::Periodic(person_weeks) = &person.series else {
            panic!("periodic series expected");
        };
        let labels: Vec<&str> = person_weeks.iter().map(|w| w.period.as_str()).collect();
        assert_eq!(
            labels,
            vec!["2025-W10 (Mar)", "2025-W11 (Mar)"],
            "zero weeks are omitted"
        );

        for week in person_weeks {
            let children_sum: Decimal = [&nodes[1], &nodes[4]]
                .iter()
                .map(|n| n.series.hours_in(week.key).unwrap_or_default())
                .sum();
            assert_eq!(week.hours, children_sum);
        }

        // W10: 10.00 (issue 1) + 3 x 1.25 (issue 3) + 5 x 1.15 (issue 2)
        assert_eq!(person.series.hours_in(person_weeks[0].key), Some(dec!(19.50)));
    }

    #[test]
    fn test_monthly_and_daily_totals_agree() {
        let window = range(date(2025, 2, 1), date(2025, 3, 31));
        let daily = compute_distribution(&march_issues(), window, Granularity::Daily);
        let monthly = compute_distribution(&march_issues(), window, Granularity::Monthly);
        assert_eq!(daily.len(), monthly.len());
        for (d, m) in daily.iter().zip(&monthly) {
            assert_eq!(d.kind, m.kind);
            assert_eq!(d.series.total_hours(), m.series.total_hours());
        }
    }

    #[test]
    fn test_node_serializes_with_level_tag() {
        let window = range(date(2025, 3, 3), date(2025, 3, 9));
        let nodes = compute_distribution(&march_issues()[..1], window, Granularity::Weekly);

        let person = serde_json::to_value(&nodes[0]).unwrap();
        assert_eq!(person["level"], "person_summary");
        assert!(person["project"].is_null());

        let issue = serde_json::to_value(&nodes[2]).unwrap();
        assert_eq!(issue["level"], "issue");
        assert_eq!(issue["id"], 1);
        assert_eq!(issue["series"]["periodic"][0]["period"], "2025-W10 (Mar)");
        assert_eq!(issue["series"]["periodic"][0]["hours"], "10.00");
    }
}
