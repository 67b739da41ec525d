//! Calendar utilities: work days, period keys and inclusive date ranges.
//!
//! Everything here is pure. Weeks start on Monday and follow ISO 8601 week
//! numbering, so the week key of a late-December Monday may belong to the
//! next ISO year.

use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::types::ValidationError;

/// Returns true for Saturday and Sunday.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Counts non-weekend days in `[start, end]` inclusive.
///
/// Returns 0 when `end < start`.
pub fn work_day_count(start: NaiveDate, end: NaiveDate) -> u32 {
    if end < start {
        return 0;
    }
    let count = days_from(start)
        .take_while(|day| *day <= end)
        .filter(|day| !is_weekend(*day))
        .count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Consecutive days from `start`, up to and including `NaiveDate::MAX`.
fn days_from(start: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    std::iter::successors(Some(start), |day| day.succ_opt())
}

/// An inclusive range of calendar days. `end` is never before `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting `end < start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A range covering a single day.
    pub const fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    pub const fn start(self) -> NaiveDate {
        self.start
    }

    pub const fn end(self) -> NaiveDate {
        self.end
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Intersects this range with `window`. `None` when they are disjoint.
    pub fn clip(self, window: Self) -> Option<Self> {
        let start = self.start.max(window.start);
        let end = self.end.min(window.end);
        (start <= end).then_some(Self { start, end })
    }

    /// Number of calendar days in the range (always at least 1).
    pub fn len_days(self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Number of non-weekend days in the range.
    pub fn work_days(self) -> u32 {
        work_day_count(self.start, self.end)
    }

    /// Iterates every calendar day in the range, in order.
    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        days_from(self.start).take_while(move |day| *day <= end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// ISO week-based year and week number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WeekKey {
    pub iso_year: i32,
    pub week: u32,
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.iso_year, self.week)
    }
}

/// Calendar year and month (1-12).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// Typed key of a weekly or monthly bucket.
///
/// Ordering is chronological within one kind; keys of different kinds are
/// never mixed in a single series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PeriodKey {
    Week(WeekKey),
    Month(MonthKey),
}

impl PeriodKey {
    /// Display label for a bucket covering `span`.
    ///
    /// Weeks carry the month(s) the span touches, e.g. `2025-W09 (Feb~Mar)`.
    pub fn label(self, span: DateRange) -> String {
        match self {
            Self::Week(key) => {
                let first = span.start().format("%b");
                if span.start().month() == span.end().month()
                    && span.start().year() == span.end().year()
                {
                    format!("{key} ({first})")
                } else {
                    format!("{key} ({first}~{})", span.end().format("%b"))
                }
            }
            Self::Month(key) => key.to_string(),
        }
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Week(key) => key.fmt(f),
            Self::Month(key) => key.fmt(f),
        }
    }
}

pub fn week_key(date: NaiveDate) -> WeekKey {
    let iso = date.iso_week();
    WeekKey {
        iso_year: iso.year(),
        week: iso.week(),
    }
}

pub fn month_key(date: NaiveDate) -> MonthKey {
    MonthKey {
        year: date.year(),
        month: date.month(),
    }
}
