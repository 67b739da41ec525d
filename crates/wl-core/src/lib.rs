//! Workload distribution engine.
//!
//! This crate contains the pure computation behind workload reports:
//! - Calendar: work-day counting, ISO week and month keys, date ranges
//! - Allocation: spreading an issue's estimate over the work days of its span
//! - Bucketing: re-expressing daily hours as weekly or monthly buckets
//! - Aggregation: issue → project → person rollups
//! - Statistics: flat totals and completion rate
//!
//! Nothing here performs I/O or keeps state between calls; each call works
//! on the issue list it is given.

mod aggregate;
mod allocation;
mod bucket;
pub mod calendar;
mod stats;
mod types;

pub use aggregate::{AnalysisNode, NodeKind, Series, compute_distribution};
pub use allocation::{
    DailyAllocation, allocate_daily, daily_rate, round_hours, total_hours, zero_hours,
};
pub use bucket::{Period, PeriodAllocation, periods, rebucket, total_period_hours};
pub use calendar::{DateRange, MonthKey, PeriodKey, WeekKey};
pub use stats::{WorkloadStatistics, compute_statistics};
pub use types::{Granularity, IssueRecord, RawIssueRow, ValidationError};
