//! Timestamp rendering in the two ISO-8601 flavours the emulated APIs emit.

use chrono::{DateTime, SecondsFormat, Utc};

/// Current time, truncated to microseconds so rendered values round-trip.
pub fn now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now)
}

/// Microsecond precision without zone suffix (`2021-03-04T05:06:07.123456`).
pub fn iso8601(at: &DateTime<Utc>) -> String {
    at.naive_utc().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Millisecond precision with `Z` suffix (`2021-03-04T05:06:07.123Z`).
pub fn iso8601_millis(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Fractional seconds since the Unix epoch.
pub fn epoch_seconds(at: &DateTime<Utc>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap()
            + chrono::Duration::microseconds(123_456)
    }

    #[test]
    fn micros_format() {
        assert_eq!(iso8601(&fixed()), "2021-03-04T05:06:07.123456");
    }

    #[test]
    fn millis_format() {
        assert_eq!(iso8601_millis(&fixed()), "2021-03-04T05:06:07.123Z");
    }

    #[test]
    fn epoch_keeps_fraction() {
        let secs = epoch_seconds(&fixed());
        assert!((secs - 1_614_834_367.123_456).abs() < 1e-6);
    }
}
