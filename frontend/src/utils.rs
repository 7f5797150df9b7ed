use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use std::time::Duration;

/// Value format of `<input type="datetime-local">`.
const DATETIME_LOCAL: &str = "%Y-%m-%dT%H:%M";
const DATETIME_LOCAL_SECS: &str = "%Y-%m-%dT%H:%M:%S";

pub fn to_datetime_local(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format(DATETIME_LOCAL).to_string()
}

/// Browsers send minutes, or seconds when the step allows it.
pub fn parse_datetime_local(value: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(value, DATETIME_LOCAL)
        .or_else(|_| NaiveDateTime::parse_from_str(value, DATETIME_LOCAL_SECS))
        .ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

pub fn format_local(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// "1m 5s" style age, clamped at zero.
pub fn age(since: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - since).num_seconds().max(0) as u64;
    humantime::format_duration(Duration::from_secs(secs)).to_string()
}
