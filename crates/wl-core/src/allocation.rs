//! Per-issue daily allocation.
//!
//! An issue's estimate is spread evenly over the work days of its own
//! `[start, due]` span. The rate never depends on the query window, so an
//! issue that only partly overlaps the window shows the same daily intensity
//! it would under any other window.
//!
//! Hours are rounded once, when the daily rate is computed (half-up, 2 dp).
//! Every coarser figure is an exact sum of those daily values.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::calendar::{DateRange, is_weekend};
use crate::types::IssueRecord;

/// Hours allocated to one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyAllocation {
    pub date: NaiveDate,
    pub hours: Decimal,
    pub is_weekend: bool,
    /// Whether the day lies inside the issue's own span (weekends included).
    pub in_issue_span: bool,
}

/// Zero hours at display scale.
pub fn zero_hours() -> Decimal {
    Decimal::new(0, 2)
}

/// Rounds to 2 decimal places, half away from zero, and fixes the scale at 2.
pub fn round_hours(hours: Decimal) -> Decimal {
    let mut rounded = hours.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// The issue's hours per work day.
///
/// Zero when the span has no work days (weekend-only or inverted).
pub fn daily_rate(issue: &IssueRecord) -> Decimal {
    match issue.work_days() {
        0 => zero_hours(),
        days => round_hours(issue.estimated_hours / Decimal::from(days)),
    }
}

/// Produces one allocation per day of `window`.
///
/// Days on a weekend or outside the issue's span get zero hours.
pub fn allocate_daily(issue: &IssueRecord, window: DateRange) -> Vec<DailyAllocation> {
    let rate = daily_rate(issue);
    window
        .days()
        .map(|date| {
            let is_weekend = is_weekend(date);
            let in_issue_span = issue.start_date <= date && date <= issue.due_date;
            let hours = if in_issue_span && !is_weekend {
                rate
            } else {
                zero_hours()
            };
            DailyAllocation {
                date,
                hours,
                is_weekend,
                in_issue_span,
            }
        })
        .collect()
}

/// Total hours across a daily series.
pub fn total_hours(days: &[DailyAllocation]) -> Decimal {
    days.iter().fold(zero_hours(), |acc, day| acc + day.hours)
}
