use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde_json::{Number, Value};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;
use uuid::Uuid;
use validator::ValidateEmail;

static URI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:[^\s]*$").unwrap());
static HOSTNAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^[A-Za-z0-9]([A-Za-z0-9\-]{0,61}[A-Za-z0-9])?",
        r"(\.[A-Za-z0-9]([A-Za-z0-9\-]{0,61}[A-Za-z0-9])?)*$"
    ))
    .unwrap()
});

/// Check a value against a `format`. Unknown formats and values of a kind the
/// format does not apply to are accepted.
pub(crate) fn conforms(format: &str, value: &Value) -> bool {
    match value {
        Value::String(s) => string_conforms(format, s),
        Value::Number(n) => number_conforms(format, n),
        _ => true,
    }
}

fn string_conforms(format: &str, s: &str) -> bool {
    match format {
        "date" => is_date(s),
        "date-time" => is_date_time(s),
        "time" => is_time(s),
        "email" => s.validate_email(),
        // hyphenated form only
        "uuid" => s.len() == 36 && Uuid::parse_str(s).is_ok(),
        "ipv4" => s.parse::<Ipv4Addr>().is_ok(),
        "ipv6" => s.parse::<Ipv6Addr>().is_ok(),
        "uri" => URI.is_match(s),
        "hostname" => s.len() <= 253 && HOSTNAME.is_match(s),
        "byte" => STANDARD.decode(s).is_ok(),
        _ => true,
    }
}

fn number_conforms(format: &str, n: &Number) -> bool {
    match format {
        "int32" => {
            as_whole(n).is_some_and(|v| v >= i32::MIN as f64 && v <= i32::MAX as f64)
        }
        "int64" => {
            n.is_i64()
                || as_whole(n).is_some_and(|v| v >= i64::MIN as f64 && v < i64::MAX as f64)
        }
        _ => true,
    }
}

fn as_whole(n: &Number) -> Option<f64> {
    n.as_f64().filter(|f| f.fract() == 0.0)
}

/// RFC 3339 `full-date`. `%Y` alone would also take short years.
fn is_date(s: &str) -> bool {
    s.len() == 10 && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// RFC 3339 `full-time`, offset required.
fn is_time(s: &str) -> bool {
    DateTime::parse_from_rfc3339(&format!("1970-01-01T{}", s)).is_ok()
}

fn is_date_time(s: &str) -> bool {
    matches!(s.as_bytes().get(10), Some(b'T' | b't')) && DateTime::parse_from_rfc3339(s).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dates() {
        assert!(conforms("date", &json!("2024-02-29")));
        assert!(conforms("date", &json!("2000-02-29")));
        assert!(!conforms("date", &json!("1900-02-29")));
        assert!(!conforms("date", &json!("2023-02-29")));
        assert!(!conforms("date", &json!("2024-13-01")));
        assert!(!conforms("date", &json!("24-01-01")));
    }

    #[test]
    fn test_date_times() {
        assert!(conforms("date-time", &json!("2024-05-01T10:20:30Z")));
        assert!(conforms("date-time", &json!("2024-05-01T10:20:30.123+02:00")));
        assert!(!conforms("date-time", &json!("2024-05-01 10:20:30Z")));
        assert!(!conforms("date-time", &json!("2024-05-01T25:20:30Z")));
        assert!(!conforms("date-time", &json!("2023-02-29T10:20:30Z")));
    }

    #[test]
    fn test_times() {
        assert!(conforms("time", &json!("10:20:30Z")));
        assert!(conforms("time", &json!("23:59:59.5-05:30")));
        assert!(!conforms("time", &json!("10:20:30")));
        assert!(!conforms("time", &json!("10:61:30Z")));
    }

    #[test]
    fn test_string_formats() {
        assert!(conforms("email", &json!("dev@example.com")));
        assert!(!conforms("email", &json!("not-an-email")));
        assert!(conforms("uuid", &json!("123e4567-e89b-12d3-a456-426614174000")));
        assert!(!conforms("uuid", &json!("123e4567e89b12d3a456426614174000")));
        assert!(!conforms("uuid", &json!("123e4567-e89b-12d3-a456-42661417400g")));
        assert!(conforms("ipv4", &json!("10.0.0.1")));
        assert!(!conforms("ipv4", &json!("10.0.0.256")));
        assert!(conforms("ipv6", &json!("::1")));
        assert!(conforms("uri", &json!("https://example.com/a?b=c")));
        assert!(!conforms("uri", &json!("/relative/only")));
        assert!(conforms("byte", &json!("aGVsbG8=")));
        assert!(!conforms("byte", &json!("not base64!")));
        assert!(!conforms("byte", &json!("aGVsbG8")));
    }

    #[test]
    fn test_number_formats() {
        assert!(conforms("int32", &json!(2147483647)));
        assert!(!conforms("int32", &json!(2147483648_i64)));
        assert!(!conforms("int32", &json!(1.5)));
        assert!(conforms("int64", &json!(-9000000000_i64)));
        assert!(conforms("double", &json!(1.5)));
    }

    #[test]
    fn test_unknown_format_accepted() {
        assert!(conforms("x-custom", &json!("anything")));
        assert!(conforms("date", &json!(12)));
    }
}
