//! Time-of-day helpers.
//!
//! Times of day travel as `HH:MM` strings in requests and configuration files
//! (seconds are accepted on input). These helpers parse them and provide the
//! serde adapters used by [`crate::Task`] and [`crate::Constraints`].

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};

/// Parse `HH:MM` (or `HH:MM:SS`) into a time of day.
pub fn parse_hhmm(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

/// Format a time of day as `HH:MM`.
pub fn format_hhmm(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

/// Combine a calendar day and a time of day into a UTC instant.
pub fn at(day: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    day.and_time(time).and_utc()
}

/// Minutes between two instants, never negative.
pub fn minutes_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_minutes().max(0)
}

/// Length of overlap between `[a_start, a_end)` and `[b_start, b_end)`.
pub fn overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> Duration {
    let start = a_start.max(b_start);
    let end = a_end.min(b_end);
    if end > start {
        end - start
    } else {
        Duration::zero()
    }
}

/// Serde adapter for a required `HH:MM` field.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_hhmm(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_hhmm(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid time of day '{raw}', expected HH:MM")))
    }
}

/// Serde adapter for an optional `HH:MM` field.
pub mod hhmm_opt {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        time: &Option<NaiveTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match time {
            Some(t) => serializer.serialize_some(&super::format_hhmm(*t)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) => super::parse_hhmm(&s).map(Some).ok_or_else(|| {
                serde::de::Error::custom(format!("invalid time of day '{s}', expected HH:MM"))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minutes_and_seconds_forms() {
        assert_eq!(parse_hhmm("09:30"), NaiveTime::from_hms_opt(9, 30, 0));
        assert_eq!(parse_hhmm(" 17:00:00 "), NaiveTime::from_hms_opt(17, 0, 0));
        assert_eq!(parse_hhmm("25:00"), None);
        assert_eq!(parse_hhmm("noon"), None);
    }

    #[test]
    fn overlap_of_disjoint_ranges_is_zero() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let t = |h| at(day, NaiveTime::from_hms_opt(h, 0, 0).unwrap());
        assert_eq!(overlap(t(9), t(10), t(10), t(11)), Duration::zero());
        assert_eq!(overlap(t(9), t(11), t(10), t(12)), Duration::hours(1));
    }
}
