//! Decoding of Alpha Vantage JSON payloads.
//!
//! The service answers with HTTP 200 even for failures and reports them in
//! the body under `"Error Message"`, `"Note"` (throttling) or
//! `"Information"` (quota/premium). Those are mapped to
//! [`ProviderError::Api`] before any shape checks.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, SecondsFormat, TimeZone};
use chrono_tz::Tz;
use serde_json::{Map, Value};
use snafu::ResultExt;
use tracing::warn;

use crate::models::{bar::RawBar, overview::RawOverview};
use crate::providers::{DecodeSnafu, ProviderError};

const ERROR_KEYS: [&str; 3] = ["Error Message", "Note", "Information"];
const DEFAULT_TZ: Tz = chrono_tz::America::New_York;

/// Shape of the series keys: daily bars are keyed by date, intraday bars by
/// exchange-local wall-clock time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeriesLayout {
    Daily,
    Intraday,
}

fn decode_object(body: &str) -> Result<Map<String, Value>, ProviderError> {
    let value: Value = serde_json::from_str(body).context(DecodeSnafu)?;
    let Value::Object(map) = value else {
        return Err(ProviderError::shape("expected a JSON object"));
    };

    for key in ERROR_KEYS {
        if let Some(message) = map.get(key) {
            let message = message
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| message.to_string());
            return Err(ProviderError::api(message));
        }
    }

    Ok(map)
}

/// Parses an `OVERVIEW` body. An empty object is how the service answers for
/// an unknown symbol.
pub fn parse_overview(body: &str) -> Result<RawOverview, ProviderError> {
    let map = decode_object(body)?;
    if map.is_empty() {
        return Err(ProviderError::api("no overview data for symbol"));
    }
    Ok(RawOverview(map.into_iter().collect()))
}

/// Parses a `TIME_SERIES_DAILY` or `TIME_SERIES_INTRADAY` body into raw bars.
///
/// Intraday keys are converted from the zone named in the metadata (US/Eastern
/// when absent) to UTC RFC 3339 strings. Keys that cannot be read are passed
/// through untouched so the consumer can drop and log them.
pub fn parse_series(body: &str, layout: SeriesLayout) -> Result<Vec<RawBar>, ProviderError> {
    let map = decode_object(body)?;

    let tz = map
        .get("Meta Data")
        .and_then(Value::as_object)
        .and_then(|meta| {
            meta.iter()
                .find(|(k, _)| k.ends_with("Time Zone"))
                .and_then(|(_, v)| v.as_str())
        })
        .and_then(|name| Tz::from_str(name).ok())
        .unwrap_or(DEFAULT_TZ);

    let series = map
        .iter()
        .find(|(k, _)| k.starts_with("Time Series"))
        .and_then(|(_, v)| v.as_object())
        .ok_or_else(|| ProviderError::shape("missing \"Time Series\" object"))?;

    let mut bars = Vec::with_capacity(series.len());
    for (key, fields) in series {
        let timestamp = match layout {
            SeriesLayout::Daily => normalize_daily_key(key),
            SeriesLayout::Intraday => match intraday_key_to_utc(key, tz) {
                Some(ts) => ts,
                None => {
                    warn!(key = %key, tz = %tz, "intraday key has no UTC instant; passing through");
                    key.clone()
                }
            },
        };

        let field = |name: &str| fields.get(name).cloned().unwrap_or(Value::Null);
        bars.push(RawBar {
            timestamp,
            open: field("1. open"),
            high: field("2. high"),
            low: field("3. low"),
            close: field("4. close"),
            volume: field("5. volume"),
        });
    }

    Ok(bars)
}

fn normalize_daily_key(key: &str) -> String {
    NaiveDate::parse_from_str(key.trim(), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| key.to_string())
}

fn intraday_key_to_utc(key: &str, tz: Tz) -> Option<String> {
    let naive = NaiveDateTime::parse_from_str(key.trim(), "%Y-%m-%d %H:%M:%S").ok()?;
    // Ambiguous fall-back hour: take the earlier (daylight) instant.
    let local = tz.from_local_datetime(&naive).earliest()?;
    Some(
        local
            .with_timezone(&chrono::Utc)
            .to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAILY: &str = r#"{
        "Meta Data": {"1. Information": "Daily Prices", "2. Symbol": "IBM", "5. Time Zone": "US/Eastern"},
        "Time Series (Daily)": {
            "2024-01-03": {"1. open": "10.0", "2. high": "11.0", "3. low": "9.5", "4. close": "10.5", "5. volume": "1200"},
            "2024-01-02": {"1. open": "9.0", "2. high": "10.0", "3. low": "8.5", "4. close": "9.5", "5. volume": "1000"}
        }
    }"#;

    #[test]
    fn daily_series_keeps_dates_and_string_values() {
        let bars = parse_series(DAILY, SeriesLayout::Daily).unwrap();
        assert_eq!(bars.len(), 2);
        let jan2 = bars.iter().find(|b| b.timestamp == "2024-01-02").unwrap();
        assert_eq!(jan2.close, Value::from("9.5"));
        assert_eq!(jan2.volume, Value::from("1000"));
    }

    #[test]
    fn intraday_keys_become_utc() {
        let body = r#"{
            "Meta Data": {"6. Time Zone": "US/Eastern"},
            "Time Series (5min)": {
                "2024-01-02 09:30:00": {"1. open": "1", "2. high": "1", "3. low": "1", "4. close": "1", "5. volume": "1"},
                "2024-07-01 09:30:00": {"1. open": "1", "2. high": "1", "3. low": "1", "4. close": "1", "5. volume": "1"}
            }
        }"#;
        let bars = parse_series(body, SeriesLayout::Intraday).unwrap();
        let stamps: Vec<_> = bars.iter().map(|b| b.timestamp.as_str()).collect();
        // EST is UTC-5, EDT is UTC-4.
        assert!(stamps.contains(&"2024-01-02T14:30:00Z"));
        assert!(stamps.contains(&"2024-07-01T13:30:00Z"));
    }

    #[test]
    fn error_payloads_map_to_api_errors() {
        for body in [
            r#"{"Error Message": "Invalid API call."}"#,
            r#"{"Note": "Thank you for using Alpha Vantage! call frequency is 5 calls per minute"}"#,
            r#"{"Information": "daily rate limit reached"}"#,
        ] {
            let err = parse_series(body, SeriesLayout::Daily).unwrap_err();
            assert!(matches!(err, ProviderError::Api { .. }), "{err:?}");
        }
    }

    #[test]
    fn missing_series_is_a_shape_error() {
        let err = parse_series(r#"{"Meta Data": {}}"#, SeriesLayout::Daily).unwrap_err();
        assert!(matches!(err, ProviderError::Shape { .. }));
    }

    #[test]
    fn garbage_body_is_a_decode_error() {
        let err = parse_overview("<html>").unwrap_err();
        assert!(matches!(err, ProviderError::Decode { .. }));
    }

    #[test]
    fn overview_preserves_fields_and_rejects_empty() {
        let ov = parse_overview(r#"{"Symbol": "IBM", "EBITDA": "None", "PERatio": "21.3"}"#).unwrap();
        assert_eq!(ov.field("EBITDA"), Some(&Value::from("None")));
        assert_eq!(ov.0.keys().next().map(String::as_str), Some("Symbol"));

        let err = parse_overview("{}").unwrap_err();
        assert!(matches!(err, ProviderError::Api { .. }));
    }
}
