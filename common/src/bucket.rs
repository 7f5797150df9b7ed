//! Minute-granularity document keys for readings.
//!
//! A reading is stored under the minute it was taken, formatted
//! `YYYY-MM-DD_HH-mm` in the client's local time zone. Seconds and
//! sub-seconds are dropped, so every timestamp inside one minute maps to the
//! same key.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

pub const KEY_FORMAT: &str = "%Y-%m-%d_%H-%M";
const KEY_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed time bucket key '{0}', expected YYYY-MM-DD_HH-mm")]
pub struct KeyError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeBucketKey(String);

impl TimeBucketKey {
    pub fn from_datetime<Tz: TimeZone>(ts: &DateTime<Tz>) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        Self(ts.format(KEY_FORMAT).to_string())
    }

    pub fn parse(s: &str) -> Result<Self, KeyError> {
        if s.len() != KEY_LEN {
            return Err(KeyError(s.to_string()));
        }
        let naive =
            NaiveDateTime::parse_from_str(s, KEY_FORMAT).map_err(|_| KeyError(s.to_string()))?;
        // the parser tolerates unpadded fields, the key format does not
        if naive.format(KEY_FORMAT).to_string() != s {
            return Err(KeyError(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wall-clock minute this key stands for, in whatever zone produced it.
    pub fn naive(&self) -> NaiveDateTime {
        // validated on construction
        NaiveDateTime::parse_from_str(&self.0, KEY_FORMAT).unwrap_or_default()
    }
}

/// Key for `ts` in the local time zone.
pub fn derive_time_bucket_key(ts: DateTime<Utc>) -> TimeBucketKey {
    TimeBucketKey::from_datetime(&ts.with_timezone(&Local))
}

/// A selection is live when it falls on today's local calendar date.
pub fn is_live(selected: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    selected.with_timezone(&Local).date_naive() == now.with_timezone(&Local).date_naive()
}

impl fmt::Display for TimeBucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TimeBucketKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TimeBucketKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TimeBucketKey> for String {
    fn from(key: TimeBucketKey) -> Self {
        key.0
    }
}

impl AsRef<str> for TimeBucketKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};

    fn at(h: u32, m: u32, s: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 5, h, m, s)
            .unwrap()
    }

    #[test]
    fn key_is_zero_padded() {
        let key = TimeBucketKey::from_datetime(&at(9, 7, 0));
        assert_eq!(key.as_str(), "2024-03-05_09-07");
    }

    #[test]
    fn seconds_do_not_change_the_key() {
        let t = at(9, 7, 12);
        assert_eq!(
            TimeBucketKey::from_datetime(&t),
            TimeBucketKey::from_datetime(&(t + Duration::seconds(30)))
        );
        assert_eq!(
            TimeBucketKey::from_datetime(&(t + Duration::milliseconds(999))),
            TimeBucketKey::from_datetime(&at(9, 7, 0))
        );
        assert_ne!(
            TimeBucketKey::from_datetime(&t),
            TimeBucketKey::from_datetime(&(t + Duration::seconds(48)))
        );
    }

    #[test]
    fn key_uses_the_callers_zone() {
        let utc = at(9, 7, 0).with_timezone(&Utc);
        assert_eq!(TimeBucketKey::from_datetime(&utc).as_str(), "2024-03-05_07-07");
    }

    #[test]
    fn local_derivation_matches_local_formatting() {
        let now = Utc::now();
        let expected = now.with_timezone(&Local).format("%Y-%m-%d_%H-%M").to_string();
        assert_eq!(derive_time_bucket_key(now).as_str(), expected);
    }

    #[test]
    fn parse_accepts_only_the_fixed_width_form() {
        let key: TimeBucketKey = "2024-03-05_09-07".parse().unwrap();
        assert_eq!(key.naive().to_string(), "2024-03-05 09:07:00");

        for bad in [
            "2024-3-05_09-07",
            "2024-03-05 09:07",
            "2024-03-05_9-07x",
            "2024-13-05_09-07",
            "",
            "values",
        ] {
            assert!(TimeBucketKey::parse(bad).is_err(), "accepted {bad}");
        }
    }

    #[test]
    fn serializes_as_plain_string() {
        let key = TimeBucketKey::parse("2024-03-05_09-07").unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"2024-03-05_09-07\"");
        assert!(serde_json::from_str::<TimeBucketKey>("\"nope\"").is_err());
    }

    #[test]
    fn today_is_live() {
        let now = Utc::now();
        assert!(is_live(now, now));
        assert!(!is_live(now - Duration::days(2), now));
    }
}
