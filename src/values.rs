//! Predefined scalar value extraction
//!
//! One conversion function per predefined kind, shared by generated
//! bindings and by tests. All functions take the raw attribute value text
//! and fail with a value error when it does not conform.

use crate::error::{Error, Result};
use base64::Engine;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Parse a boolean value: `true`, `false`, `1` or `0`
pub fn parse_bool(value: &str) -> Result<bool> {
    match value {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(Error::Value(format!("'{}' is not a valid bool", value))),
    }
}

/// Parse a signed integer value
pub fn parse_int(value: &str) -> Result<i64> {
    value
        .parse::<i64>()
        .map_err(|_| Error::Value(format!("'{}' is not a valid int", value)))
}

/// Parse an unsigned integer value
pub fn parse_uint(value: &str) -> Result<u64> {
    value
        .parse::<u64>()
        .map_err(|_| Error::Value(format!("'{}' is not a valid uint", value)))
}

/// Parse a floating-point number value
pub fn parse_number(value: &str) -> Result<f64> {
    value
        .parse::<f64>()
        .map_err(|_| Error::Value(format!("'{}' is not a valid number", value)))
}

/// Parse a date value in `YYYY-MM-DD` form
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| Error::Value(format!("'{}' is not a valid date", value)))
}

/// Parse a time value in `HH:MM:SS` form, with optional fraction
pub fn parse_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M:%S%.f")
        .map_err(|_| Error::Value(format!("'{}' is not a valid time", value)))
}

/// Parse a date-time value in `YYYY-MM-DDTHH:MM:SS` form, with optional
/// fraction
pub fn parse_date_time(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|_| Error::Value(format!("'{}' is not a valid date-time", value)))
}

/// Decode a base64 value; whitespace is stripped before decoding
pub fn parse_base64(value: &str) -> Result<Vec<u8>> {
    let cleaned: String = value.split_whitespace().collect();
    base64::engine::general_purpose::STANDARD
        .decode(cleaned)
        .map_err(|_| Error::Value(format!("'{}' is not a valid base64 encoding", value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true").unwrap());
        assert!(parse_bool("1").unwrap());
        assert!(!parse_bool("false").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("yes").is_err());
        assert!(parse_bool("TRUE").is_err());
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("-42").unwrap(), -42);
        assert!(parse_int("4.2").is_err());
        assert!(parse_int("").is_err());
    }

    #[test]
    fn test_parse_uint() {
        assert_eq!(parse_uint("42").unwrap(), 42);
        assert!(parse_uint("-1").is_err());
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("2.5").unwrap(), 2.5);
        assert_eq!(parse_number("-3").unwrap(), -3.0);
        assert!(parse_number("two").is_err());
    }

    #[test]
    fn test_parse_date() {
        let date = parse_date("2024-02-29").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("29/02/2024").is_err());
    }

    #[test]
    fn test_parse_time() {
        assert!(parse_time("23:59:59").is_ok());
        assert!(parse_time("12:30:00.250").is_ok());
        assert!(parse_time("25:00:00").is_err());
    }

    #[test]
    fn test_parse_date_time() {
        assert!(parse_date_time("2024-01-15T08:30:00").is_ok());
        assert!(parse_date_time("2024-01-15 08:30:00").is_err());
    }

    #[test]
    fn test_parse_base64() {
        assert_eq!(parse_base64("SGVsbG8=").unwrap(), b"Hello");
        assert_eq!(parse_base64("SGVs bG8=").unwrap(), b"Hello");
        assert!(parse_base64("").unwrap().is_empty());
        assert!(parse_base64("!!!").is_err());
    }
}
