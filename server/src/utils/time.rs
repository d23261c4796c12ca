//! Time utility functions

use chrono::{DateTime, Utc};

/// Current time as microseconds since Unix epoch
pub fn now_micros() -> i64 {
    Utc::now().timestamp_micros()
}

/// Convert microseconds since Unix epoch to DateTime<Utc>
pub fn micros_to_datetime(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or_else(|| {
        tracing::warn!(micros, "Invalid timestamp, using epoch");
        DateTime::UNIX_EPOCH
    })
}

/// Convert microseconds since Unix epoch to ISO 8601 string (microsecond precision)
pub fn micros_to_iso(micros: i64) -> String {
    micros_to_datetime(micros).to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_micros_to_datetime_epoch() {
        let dt = micros_to_datetime(0);
        assert_eq!(dt.year(), 1970);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 1);
    }

    #[test]
    fn test_micros_to_iso_known_value() {
        // 2025-06-22 18:52:01 UTC
        assert_eq!(
            micros_to_iso(1_750_618_321_000_100),
            "2025-06-22T18:52:01.000100Z"
        );
    }

    #[test]
    fn test_now_micros_is_recent() {
        // Later than 2024-01-01
        assert!(now_micros() > 1_704_067_200_000_000);
    }
}
