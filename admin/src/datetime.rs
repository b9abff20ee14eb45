//! Local datetime inputs.
//!
//! Function start and end times are edited as `YYYY-MM-DDTHH:MM` in the
//! configured offset. Conversion to UTC happens once, when the submission
//! payload is built.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

/// Format of datetime inputs
pub const LOCAL_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Parse a local input into an absolute timestamp
///
/// Seconds are accepted (`2025-12-05T20:00:00`) since some browsers send them.
#[must_use]
pub fn local_to_utc(input: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let input = input.trim();
    let naive = NaiveDateTime::parse_from_str(input, LOCAL_INPUT_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S"))
        .ok()?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|local| local.with_timezone(&Utc))
}

/// Render a server timestamp as a local input; unparsable values become empty
///
/// Accepts RFC 3339 (`2025-12-05T20:00:00.000Z`) and offset-less
/// timestamps, which are taken as UTC.
#[must_use]
pub fn server_to_local(timestamp: &str, offset: FixedOffset) -> String {
    let timestamp = timestamp.trim();
    let utc = DateTime::parse_from_rfc3339(timestamp)
        .map(|at| at.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(timestamp, format).ok())
                .map(|naive| naive.and_utc())
        });

    utc.map(|at| at.with_timezone(&offset).format(LOCAL_INPUT_FORMAT).to_string())
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn offset(minutes: i32) -> FixedOffset {
        FixedOffset::east_opt(minutes * 60).unwrap()
    }

    #[test]
    fn test_local_to_utc_in_utc() {
        let at = local_to_utc("2025-12-05T20:00", offset(0)).unwrap();
        assert_eq!(at.to_rfc3339(), "2025-12-05T20:00:00+00:00");
    }

    #[test]
    fn test_local_to_utc_applies_offset() {
        let at = local_to_utc("2025-12-05T20:00", offset(-300)).unwrap();
        assert_eq!(at.to_rfc3339(), "2025-12-06T01:00:00+00:00");
    }

    #[test]
    fn test_local_to_utc_rejects_garbage() {
        assert!(local_to_utc("", offset(0)).is_none());
        assert!(local_to_utc("05/12/2025 20:00", offset(0)).is_none());
        assert!(local_to_utc("2025-13-05T20:00", offset(0)).is_none());
    }

    #[test]
    fn test_server_to_local() {
        assert_eq!(server_to_local("2025-12-06T01:00:00.000Z", offset(-300)), "2025-12-05T20:00");
        assert_eq!(server_to_local("2025-12-05T20:00:00", offset(0)), "2025-12-05T20:00");
        assert_eq!(server_to_local("not a date", offset(0)), "");
    }
}
