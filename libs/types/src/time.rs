//! Wall-clock helpers
//!
//! Event times come from the feed; these are only for ingestion time and
//! the "today" boundary of the stats endpoint.

use chrono::{DateTime, Local, NaiveTime, TimeZone, Timelike, Utc};

/// Current wall-clock time, Unix millis.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Unix millis of the most recent local midnight.
pub fn local_day_start_millis() -> i64 {
    day_start_millis(&Local::now())
}

/// Unix millis of midnight on the calendar day of `now` in its own zone.
///
/// On days where midnight does not exist (DST gap) the earliest valid
/// instant of the day is used.
pub fn day_start_millis<Tz: TimeZone>(now: &DateTime<Tz>) -> i64 {
    let tz = now.timezone();
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight).earliest() {
        Some(start) => start.timestamp_millis(),
        None => now.timestamp_millis() - i64::from(now.time().num_seconds_from_midnight()) * 1000,
    }
}
