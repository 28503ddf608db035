//! British Summer Time detection
//!
//! Summer time runs from 01:00 UTC on the last Sunday of March until
//! 01:00 UTC on the last Sunday of October.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc, Weekday};

/// Hour (UTC) at which the clocks change on both transition Sundays
pub const TRANSITION_HOUR_UTC: u32 = 1;

/// Last Sunday of the given month, found by walking back from the month's last day
pub fn last_sunday(year: i32, month: u32) -> NaiveDate {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    let mut day = first_of_next
        .and_then(|d| d.pred_opt())
        .unwrap_or(NaiveDate::MIN);

    while day.weekday() != Weekday::Sun {
        day = match day.pred_opt() {
            Some(prev) => prev,
            None => break,
        };
    }
    day
}

/// Instant at which the clocks change on the last Sunday of `month`
fn transition(year: i32, month: u32) -> DateTime<Utc> {
    let naive = last_sunday(year, month)
        .and_hms_opt(TRANSITION_HOUR_UTC, 0, 0)
        .unwrap_or_default();
    Utc.from_utc_datetime(&naive)
}

/// Check whether `instant` falls in summer time for its own UTC year.
/// The start boundary is inclusive and the end boundary exclusive.
pub fn is_daylight_saving(instant: DateTime<Utc>) -> bool {
    let year = instant.year();
    let starts = transition(year, 3);
    let ends = transition(year, 10);
    instant >= starts && instant < ends
}
