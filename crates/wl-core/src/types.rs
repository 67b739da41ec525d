//! Core type definitions with validation.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::allocation::round_hours;
use crate::calendar::{DateRange, work_day_count};

/// Validation errors for engine inputs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required issue field was null.
    #[error("issue #{issue_id} has no {field}")]
    MissingField { issue_id: i64, field: &'static str },

    /// The issue is due before it starts.
    #[error("issue #{issue_id} is due {due} before it starts {start}")]
    InvertedSpan {
        issue_id: i64,
        start: NaiveDate,
        due: NaiveDate,
    },

    /// The estimate was below zero.
    #[error("issue #{issue_id} has a negative estimate of {hours} hours")]
    NegativeEstimate { issue_id: i64, hours: Decimal },

    /// A date range ends before it starts.
    #[error("range end {end} is before start {start}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    /// Unrecognised granularity name.
    #[error("unknown granularity: {value} (expected daily, weekly or monthly)")]
    UnknownGranularity { value: String },
}

/// Time-bucket size for distribution output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Daily,
    /// Monday-start ISO weeks.
    Weekly,
    /// Calendar months.
    Monthly,
}

impl Granularity {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Granularity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "day" => Ok(Self::Daily),
            "weekly" | "week" => Ok(Self::Weekly),
            "monthly" | "month" => Ok(Self::Monthly),
            _ => Err(ValidationError::UnknownGranularity {
                value: s.to_string(),
            }),
        }
    }
}

/// One issue assigned to one person, already joined with its group and project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub group: String,
    pub person: String,
    pub project: String,
    pub issue_id: i64,
    pub subject: String,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    pub estimated_hours: Decimal,
    pub status: String,
    pub is_closed: bool,
    pub closed_on: Option<NaiveDate>,
}

impl IssueRecord {
    /// The issue's own `[start, due]` span, or `None` if it is inverted.
    pub fn span(&self) -> Option<DateRange> {
        DateRange::new(self.start_date, self.due_date).ok()
    }

    /// Work days in the issue's own span.
    pub fn work_days(&self) -> u32 {
        work_day_count(self.start_date, self.due_date)
    }

    /// Estimate divided by the calendar-day length of the span, rounded to 2 dp.
    ///
    /// Counts weekends, unlike the distribution rate. `None` for an inverted span.
    pub fn avg_hours_per_day(&self) -> Option<Decimal> {
        let days = self.span()?.len_days();
        Some(round_hours(self.estimated_hours / Decimal::from(days)))
    }
}

/// An issue row as read from a tracker, before null checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawIssueRow {
    pub group: String,
    pub person: String,
    pub project: String,
    pub issue_id: i64,
    pub subject: String,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub estimated_hours: Option<Decimal>,
    pub status: String,
    pub is_closed: bool,
    pub closed_on: Option<NaiveDate>,
}

impl TryFrom<RawIssueRow> for IssueRecord {
    type Error = ValidationError;

    fn try_from(row: RawIssueRow) -> Result<Self, Self::Error> {
        let issue_id = row.issue_id;
        let missing = |field: &'static str| ValidationError::MissingField { issue_id, field };

        let start_date = row.start_date.ok_or_else(|| missing("start date"))?;
        let due_date = row.due_date.ok_or_else(|| missing("due date"))?;
        let estimated_hours = row.estimated_hours.ok_or_else(|| missing("estimated hours"))?;

        if due_date < start_date {
            return Err(ValidationError::InvertedSpan {
                issue_id,
                start: start_date,
                due: due_date,
            });
        }
        if estimated_hours < Decimal::ZERO {
            return Err(ValidationError::NegativeEstimate {
                issue_id,
                hours: estimated_hours,
            });
        }

        Ok(Self {
            group: row.group,
            person: row.person,
            project: row.project,
            issue_id,
            subject: row.subject,
            start_date,
            due_date,
            estimated_hours,
            status: row.status,
            is_closed: row.is_closed,
            closed_on: row.closed_on,
        })
    }
}
