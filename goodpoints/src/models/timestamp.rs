//! Timestamp coercion for server payloads.
//!
//! The backend is not consistent about offsets: some endpoints emit RFC 3339,
//! others a bare `YYYY-MM-DDTHH:MM:SS`. Bare values are wall-clock time in
//! the viewer's local zone.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serializer};

use crate::error::{Error, Result};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a server timestamp string.
pub fn parse(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return from_local(naive, &Local);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return from_local(naive, &Local);
        }
    }

    Err(Error::parse(format!("unrecognised timestamp `{raw}`")))
}

/// Resolve a wall-clock time in `tz` to an instant.
///
/// An ambiguous time (clocks turned back) takes the earlier instant. A time
/// skipped by a forward jump lands one hour later.
fn from_local<Tz: TimeZone>(naive: NaiveDateTime, tz: &Tz) -> Result<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            naive
                .checked_add_signed(TimeDelta::hours(1))
                .and_then(|shifted| tz.from_local_datetime(&shifted).earliest())
        })
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| Error::parse(format!("no such local time `{naive}`")))
}

pub(crate) fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_rfc3339())
}

pub(crate) fn deserialize<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_parse_rfc3339() {
        let dt = parse("2024-03-01T23:59:00+02:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 3, 1, 21, 59, 0).unwrap());
    }

    #[test]
    fn test_parse_naive_is_local_wall_clock() {
        let expected = Local
            .with_ymd_and_hms(2024, 3, 1, 23, 59, 0)
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(parse("2024-03-01T23:59").unwrap(), expected);
        assert_eq!(parse("2024-03-01 23:59:00").unwrap(), expected);
        assert_eq!(parse("2024-03-01T23:59:00.000").unwrap(), expected);

        let local = parse("2024-03-01T23:59").unwrap().with_timezone(&Local);
        assert_eq!(local.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_parse_bare_date_is_local_midnight() {
        let local = parse("2024-02-29").unwrap().with_timezone(&Local);
        assert_eq!(local.date_naive(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_from_local_in_fixed_zone() {
        let minus_five = FixedOffset::west_opt(5 * 3600).unwrap();
        let naive = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap();

        assert_eq!(
            from_local(naive, &minus_five).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 2, 4, 59, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse("yesterday").is_err());
        assert!(parse("").is_err());
    }
}
