//! Raw time-series bar as delivered by a provider.
//!
//! Values are kept as JSON scalars on purpose: vendors send numbers as
//! strings, use placeholders such as `"None"` or `"-"`, or omit fields. The
//! consumer validates each value into its semantic type and decides what a
//! bad value becomes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single OHLCV observation before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    /// Bar key as text: `YYYY-MM-DD` for daily series, an RFC 3339 UTC
    /// instant for intraday series.
    pub timestamp: String,

    /// Opening price.
    pub open: Value,

    /// Highest price during the bar interval.
    pub high: Value,

    /// Lowest price during the bar interval.
    pub low: Value,

    /// Closing price.
    pub close: Value,

    /// Volume traded during the bar interval.
    pub volume: Value,
}

impl RawBar {
    /// Convenience constructor for numeric bars (fixtures, tests, adapters
    /// that already decoded numbers).
    pub fn from_numbers(
        timestamp: impl Into<String>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            open: Value::from(open),
            high: Value::from(high),
            low: Value::from(low),
            close: Value::from(close),
            volume: Value::from(volume),
        }
    }
}
