use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde_json::json;

use crate::error::{AppError, AppResult};

/// What happens when two windows touch at a single instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgePolicy {
    /// Touching endpoints collide. Used for blocks: a partial block ending
    /// exactly where the requested window starts still claims that minute.
    TouchingConflicts,
    /// Touching endpoints are fine. Used event-vs-event: a session ending
    /// exactly when the next begins is a legal back-to-back schedule.
    TouchingAllowed,
}

/// Interval overlap test. Pure; both windows must already be ordered
/// (`start <= end`), which every caller guarantees via [`ensure_window`]
/// or the store invariants.
pub fn overlaps<Tz: TimeZone>(
    a_start: &DateTime<Tz>,
    a_end: &DateTime<Tz>,
    b_start: &DateTime<Tz>,
    b_end: &DateTime<Tz>,
    policy: EdgePolicy,
) -> bool {
    match policy {
        EdgePolicy::TouchingConflicts => a_start <= b_end && b_start <= a_end,
        EdgePolicy::TouchingAllowed => a_start < b_end && b_start < a_end,
    }
}

pub fn ensure_window(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<()> {
    if end <= start {
        Err(AppError::validation_with_details(
            "window end must be after start",
            json!({"start": start.to_rfc3339(), "end": end.to_rfc3339()}),
        ))
    } else {
        Ok(())
    }
}

pub fn duration_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<i64> {
    let total = end.signed_duration_since(start).num_minutes();
    if total < 0 {
        Err(AppError::validation("end must not precede start"))
    } else {
        Ok(total)
    }
}

/// The `[00:00, 24:00)` window of one calendar date, in UTC.
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).expect("midnight is valid"));
    (start, start + Duration::days(1))
}

/// Every calendar date the window `[start, end)` touches, in order.
pub fn dates_covered(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = start.date_naive();
    let last = if end.time() == chrono::NaiveTime::MIN && end > start {
        // An end exactly at midnight does not reach into the next day.
        (end - Duration::nanoseconds(1)).date_naive()
    } else {
        end.date_naive()
    };
    while current <= last {
        dates.push(current);
        current = current.succ_opt().unwrap_or(current);
        if dates.len() > 1000 {
            break;
        }
    }
    dates
}
