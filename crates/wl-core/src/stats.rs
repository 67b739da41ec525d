//! Flat workload statistics over a raw issue list.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::allocation::{round_hours, zero_hours};
use crate::types::IssueRecord;

/// Totals and completion figures for a set of issues.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkloadStatistics {
    pub issues: Vec<IssueRecord>,
    pub total_estimated_hours: Decimal,
    /// Mean of each issue's calendar-day rate.
    pub avg_hours_per_day: Decimal,
    pub total_issues: usize,
    pub closed_issues: usize,
    pub open_issues: usize,
    /// Percentage of closed issues, 0 when there are none.
    pub completion_rate: f64,
}

/// Summarises `issues` without any time bucketing.
///
/// `avg_hours_per_day` averages [`IssueRecord::avg_hours_per_day`], which
/// divides by calendar days rather than work days. An issue whose rate is
/// undefined adds nothing to the sum but still counts toward the mean.
pub fn compute_statistics(issues: Vec<IssueRecord>) -> WorkloadStatistics {
    let total_issues = issues.len();
    let closed_issues = issues.iter().filter(|i| i.is_closed).count();

    let total_hours: Decimal = issues.iter().map(|i| i.estimated_hours).sum();
    let rate_sum: Decimal = issues.iter().filter_map(IssueRecord::avg_hours_per_day).sum();

    let (avg_hours_per_day, completion_rate) = if total_issues == 0 {
        (zero_hours(), 0.0)
    } else {
        #[allow(clippy::cast_precision_loss)]
        let rate = closed_issues as f64 / total_issues as f64 * 100.0;
        (round_hours(rate_sum / Decimal::from(total_issues)), rate)
    };

    tracing::debug!(
        total_issues,
        closed_issues,
        %total_hours,
        "computed workload statistics"
    );

    WorkloadStatistics {
        issues,
        total_estimated_hours: round_hours(total_hours),
        avg_hours_per_day,
        total_issues,
        closed_issues,
        open_issues: total_issues - closed_issues,
        completion_rate,
    }
}
