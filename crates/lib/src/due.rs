//! Due-date normalization: ISO-8601 timestamps to the local `MM/DD/YYYY HH:MM` form that
//! AppleScript's `date "..."` coercion accepts.
//!
//! Best effort: anything unparsable becomes an empty string and the reminder is created
//! without a due date.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use std::fmt::Display;

/// Output format (24-hour, local time).
pub const DUE_FORMAT: &str = "%m/%d/%Y %H:%M";

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M%:z", "%Y-%m-%d %H:%M:%S%.f%:z"];

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// Normalize `iso` into the host's local time zone. Empty string means "no due date".
pub fn normalize_due(iso: &str) -> String {
    normalize_due_in(iso, &Local)
}

/// Same as [`normalize_due`] against an explicit time zone.
pub fn normalize_due_in<Tz>(iso: &str, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match parse_due(iso, tz) {
        Some(dt) => dt.format(DUE_FORMAT).to_string(),
        None => {
            if !iso.trim().is_empty() {
                log::debug!("ignoring unparsable due date {:?}", iso);
            }
            String::new()
        }
    }
}

fn parse_due<Tz: TimeZone>(iso: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    let iso = iso.trim();
    if iso.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(iso) {
        return Some(dt.with_timezone(tz));
    }

    let with_offset = match iso.strip_suffix('Z').or_else(|| iso.strip_suffix('z')) {
        Some(rest) => format!("{}+00:00", rest),
        None => iso.to_string(),
    };
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&with_offset, fmt) {
            return Some(dt.with_timezone(tz));
        }
    }

    // No offset: the timestamp is already wall-clock time in `tz`.
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(iso, fmt) {
            return tz.from_local_datetime(&naive).earliest();
        }
    }
    let date = NaiveDate::parse_from_str(iso, "%Y-%m-%d").ok()?;
    tz.from_local_datetime(&date.and_hms_opt(0, 0, 0)?).earliest()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn utc_instant_formats_in_utc() {
        assert_eq!(normalize_due_in("2024-02-02T10:00:00.000Z", &Utc), "02/02/2024 10:00");
    }

    #[test]
    fn utc_instant_shifts_into_target_zone() {
        let cet = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(normalize_due_in("2024-02-02T10:00:00.000Z", &cet), "02/02/2024 11:00");
        let est = FixedOffset::west_opt(5 * 3600).unwrap();
        assert_eq!(normalize_due_in("2024-02-02T03:30:00Z", &est), "02/01/2024 22:30");
    }

    #[test]
    fn explicit_offset_is_honoured() {
        assert_eq!(normalize_due_in("2024-07-04T18:45:00+02:00", &Utc), "07/04/2024 16:45");
        assert_eq!(normalize_due_in("2024-07-04T18:45+02:00", &Utc), "07/04/2024 16:45");
        assert_eq!(normalize_due_in("2024-07-04T18:45Z", &Utc), "07/04/2024 18:45");
    }

    #[test]
    fn naive_timestamp_is_wall_clock_in_zone() {
        let cet = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(normalize_due_in("2024-02-02T09:15:00", &cet), "02/02/2024 09:15");
        assert_eq!(normalize_due_in("2024-02-02T09:15", &cet), "02/02/2024 09:15");
        assert_eq!(normalize_due_in("2024-02-02", &cet), "02/02/2024 00:00");
    }

    #[test]
    fn local_zone_matches_chrono_conversion() {
        let expected = DateTime::parse_from_rfc3339("2024-02-02T10:00:00.000Z")
            .unwrap()
            .with_timezone(&Local)
            .format(DUE_FORMAT)
            .to_string();
        let got = normalize_due("2024-02-02T10:00:00.000Z");
        assert_eq!(got, expected);
        assert_eq!(got.len(), "MM/DD/YYYY HH:MM".len());
    }

    #[test]
    fn garbage_and_empty_yield_empty() {
        assert_eq!(normalize_due("not-a-date"), "");
        assert_eq!(normalize_due(""), "");
        assert_eq!(normalize_due("   "), "");
        assert_eq!(normalize_due("2024-13-45T99:00:00Z"), "");
        assert_eq!(normalize_due("02/02/2024 10:00"), "");
    }
}
