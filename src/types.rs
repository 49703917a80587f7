/// Shared types used across the codebase

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User roles governing authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Student,
    Sensor,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Teacher, Role::Student, Role::Sensor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Teacher => "teacher",
            Role::Student => "student",
            Role::Sensor => "sensor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("'{}' is not a valid role", s))
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Parse a timestamp the way clients send them: RFC 3339, a bare
/// `YYYY-MM-DDTHH:MM:SS[.fff]` (taken as UTC) or a bare date (midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}

/// Whole UTC days from `start`'s date through `end`'s date, as the half-open
/// range `[first, past_end)` where `past_end` is midnight after `end`'s day.
pub fn utc_day_range(start: DateTime<Utc>, end: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let first = Utc.from_utc_datetime(&start.date_naive().and_time(NaiveTime::MIN));
    let past_end = Utc.from_utc_datetime(&end.date_naive().and_time(NaiveTime::MIN)) + Duration::days(1);
    (first, past_end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn parses_supported_timestamp_shapes() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-01T10:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T12:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T10:30:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-03-01"),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn day_range_covers_whole_days() {
        let start = Utc.with_ymd_and_hms(2024, 1, 5, 17, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 7, 3, 0, 0).unwrap();
        let (first, past_end) = utc_day_range(start, end);
        assert_eq!(first, Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap());
        assert_eq!(past_end, Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap());

        let last_instant = Utc.with_ymd_and_hms(2024, 1, 7, 23, 59, 59).unwrap() + Duration::microseconds(999_500);
        assert!(last_instant < past_end);
    }
}
