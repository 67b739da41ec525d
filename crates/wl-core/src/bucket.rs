//! Weekly and monthly re-bucketing of daily allocations.
//!
//! Buckets are calendar weeks (Monday start) or calendar months, clipped to
//! the query window. A bucket's hours are the exact sum of the daily values
//! that fall inside its clipped range; buckets summing to zero are dropped.

use chrono::{Datelike, Duration, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::allocation::{DailyAllocation, zero_hours};
use crate::calendar::{DateRange, PeriodKey, month_key, week_key};
use crate::types::Granularity;

/// A bucket of the query window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub key: PeriodKey,
    /// The bucket's days, clipped to the window.
    pub range: DateRange,
}

impl Period {
    pub fn label(&self) -> String {
        self.key.label(self.range)
    }
}

/// Hours allocated to one weekly or monthly bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodAllocation {
    pub key: PeriodKey,
    /// Display label, e.g. `2025-W10 (Mar)` or `2025-03`.
    pub period: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub hours: Decimal,
    pub granularity: Granularity,
}

impl PeriodAllocation {
    pub fn new(period: Period, hours: Decimal, granularity: Granularity) -> Self {
        Self {
            key: period.key,
            period: period.label(),
            start_date: period.range.start(),
            end_date: period.range.end(),
            hours,
            granularity,
        }
    }
}

/// Splits `window` into buckets of the given granularity, in order.
///
/// Daily granularity has no coarser buckets and yields an empty list.
pub fn periods(window: DateRange, granularity: Granularity) -> Vec<Period> {
    match granularity {
        Granularity::Daily => Vec::new(),
        Granularity::Weekly => week_periods(window),
        Granularity::Monthly => month_periods(window),
    }
}

fn week_periods(window: DateRange) -> Vec<Period> {
    let mut periods = Vec::new();
    let mut next = Some(window.start());

    // Days of one ISO week share its key, so the clipped first day keys the week.
    while let Some(first) = next.filter(|day| *day <= window.end()) {
        let to_sunday = 6 - i64::from(first.weekday().num_days_from_monday());
        let sunday = first
            .checked_add_signed(Duration::days(to_sunday))
            .unwrap_or(NaiveDate::MAX);
        if let Ok(range) = DateRange::new(first, sunday.min(window.end())) {
            periods.push(Period {
                key: PeriodKey::Week(week_key(first)),
                range,
            });
        }
        next = sunday.succ_opt();
    }
    periods
}

fn month_periods(window: DateRange) -> Vec<Period> {
    let mut periods = Vec::new();
    let Some(mut first) = NaiveDate::from_ymd_opt(window.start().year(), window.start().month(), 1)
    else {
        return periods;
    };

    while first <= window.end() {
        let next = first.checked_add_months(Months::new(1));
        let last = next.and_then(|n| n.pred_opt()).unwrap_or(NaiveDate::MAX);
        if let Some(range) = DateRange::new(first, last)
            .ok()
            .and_then(|month| month.clip(window))
        {
            periods.push(Period {
                key: PeriodKey::Month(month_key(first)),
                range,
            });
        }
        match next {
            Some(next) => first = next,
            None => break,
        }
    }
    periods
}

/// Re-expresses a full-window daily series as weekly or monthly buckets.
///
/// `days` must be the output of [`allocate_daily`](crate::allocate_daily) for
/// the same `window`. Buckets with zero hours are omitted.
pub fn rebucket(
    days: &[DailyAllocation],
    window: DateRange,
    granularity: Granularity,
) -> Vec<PeriodAllocation> {
    let mut days = days.iter().peekable();
    let mut buckets = Vec::new();

    for period in periods(window, granularity) {
        let mut hours = zero_hours();
        while let Some(day) = days.next_if(|d| d.date <= period.range.end()) {
            if period.range.contains(day.date) {
                hours += day.hours;
            }
        }
        if !hours.is_zero() {
            buckets.push(PeriodAllocation::new(period, hours, granularity));
        }
    }
    buckets
}

/// Total hours across a bucketed series.
pub fn total_period_hours(buckets: &[PeriodAllocation]) -> Decimal {
    buckets.iter().fold(zero_hours(), |acc, b| acc + b.hours)
}
