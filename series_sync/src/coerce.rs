//! Field coercion for vendor payloads.
//!
//! Every value the source hands over is a JSON scalar of unknown quality.
//! These helpers accept it only when it is (or converts without loss to)
//! the requested type and yield `None` otherwise. Placeholders such as
//! `"None"`, `"-"` and `""` are treated as missing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

const PLACEHOLDERS: [&str; 5] = ["", "-", "none", "null", "n/a"];

fn is_placeholder(s: &str) -> bool {
    let s = s.trim();
    PLACEHOLDERS.iter().any(|p| s.eq_ignore_ascii_case(p))
}

fn as_clean_str(v: &Value) -> Option<&str> {
    match v {
        Value::String(s) if !is_placeholder(s) => Some(s.trim()),
        _ => None,
    }
}

/// A finite floating-point number.
pub fn number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        _ => as_clean_str(v)?.parse::<f64>().ok()?,
    };
    n.is_finite().then_some(n)
}

/// A whole number that fits `i64`. Fractional values are rejected.
pub fn integer(v: &Value) -> Option<i64> {
    if let Value::Number(n) = v {
        if let Some(i) = n.as_i64() {
            return Some(i);
        }
    }
    if let Some(s) = as_clean_str(v) {
        if let Ok(i) = s.parse::<i64>() {
            return Some(i);
        }
    }
    whole_f64_to_i64(number(v)?)
}

fn whole_f64_to_i64(f: f64) -> Option<i64> {
    // 2^63 is exactly representable; anything at or above it overflows.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (f.fract() == 0.0 && f >= -LIMIT && f < LIMIT).then_some(f as i64)
}

/// Non-placeholder text. Numbers are rendered as text.
pub fn text(v: &Value) -> Option<String> {
    match v {
        Value::Number(n) => Some(n.to_string()),
        _ => as_clean_str(v).map(str::to_string),
    }
}

/// A calendar date in `YYYY-MM-DD` form.
pub fn date(v: &Value) -> Option<NaiveDate> {
    date_key(as_clean_str(v)?)
}

/// Key of a daily bar. Accepts `YYYY-MM-DD`, or an RFC 3339 instant whose
/// UTC date is taken.
pub fn date_key(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| timestamp_key(s).map(|ts| ts.date()))
}

/// Key of an intraday bar as a naive UTC timestamp. Accepts RFC 3339 with any
/// offset, or a naive `YYYY-MM-DD HH:MM:SS` already in UTC.
pub fn timestamp_key(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).naive_utc());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn placeholders_are_missing() {
        for v in [json!("None"), json!("-"), json!(""), json!(null), json!("  none ")] {
            assert_eq!(number(&v), None, "{v}");
            assert_eq!(integer(&v), None, "{v}");
            assert_eq!(text(&v), None, "{v}");
        }
    }

    #[test]
    fn numbers_from_strings_and_json() {
        assert_eq!(number(&json!("12.5")), Some(12.5));
        assert_eq!(number(&json!(3)), Some(3.0));
        assert_eq!(number(&json!("NaN")), None);
        assert_eq!(number(&json!("inf")), None);
        assert_eq!(number(&json!(true)), None);
    }

    #[test]
    fn integers_reject_fractions() {
        assert_eq!(integer(&json!("2905340018688")), Some(2_905_340_018_688));
        assert_eq!(integer(&json!(42.0)), Some(42));
        assert_eq!(integer(&json!("1e3")), Some(1000));
        assert_eq!(integer(&json!("1.5")), None);
        assert_eq!(integer(&json!(1e30)), None);
    }

    #[test]
    fn keys() {
        assert_eq!(
            date_key("2024-01-02"),
            NaiveDate::from_ymd_opt(2024, 1, 2)
        );
        assert_eq!(date(&json!("2024-13-01")), None);
        let ts = timestamp_key("2024-01-02T09:30:00-05:00").unwrap();
        assert_eq!(ts.to_string(), "2024-01-02 14:30:00");
        assert_eq!(
            timestamp_key("2024-01-02 14:30:00"),
            Some(ts)
        );
        assert_eq!(timestamp_key("yesterday"), None);
    }

    proptest! {
        #[test]
        fn any_finite_f64_survives_as_string(x in proptest::num::f64::NORMAL | proptest::num::f64::ZERO) {
            let parsed = number(&Value::String(x.to_string()));
            prop_assert_eq!(parsed, Some(x));
        }

        #[test]
        fn any_i64_survives_as_string(x in any::<i64>()) {
            prop_assert_eq!(integer(&Value::String(x.to_string())), Some(x));
        }

        #[test]
        fn integer_never_accepts_fractions(whole in -1_000_000i64..1_000_000, frac in 0.01f64..0.99) {
            let v = json!(whole as f64 + frac);
            prop_assert_eq!(integer(&v), None);
        }
    }
}
