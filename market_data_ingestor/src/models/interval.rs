//! Native intraday sampling intervals.

use std::{fmt, str::FromStr};

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown intraday interval: {0:?} (expected 1min, 5min, 15min, 30min or 60min)")]
pub struct IntervalParseError(pub String);

/// Bar width of an intraday series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum IntradayInterval {
    OneMinute,
    #[default]
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    SixtyMinutes,
}

impl IntradayInterval {
    pub const fn minutes(self) -> i64 {
        match self {
            Self::OneMinute => 1,
            Self::FiveMinutes => 5,
            Self::FifteenMinutes => 15,
            Self::ThirtyMinutes => 30,
            Self::SixtyMinutes => 60,
        }
    }

    /// Distance between two adjacent bars.
    pub fn step(self) -> Duration {
        Duration::minutes(self.minutes())
    }

    /// Wire name used by the vendor API (`"5min"`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneMinute => "1min",
            Self::FiveMinutes => "5min",
            Self::FifteenMinutes => "15min",
            Self::ThirtyMinutes => "30min",
            Self::SixtyMinutes => "60min",
        }
    }
}

impl fmt::Display for IntradayInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntradayInterval {
    type Err = IntervalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1min" => Ok(Self::OneMinute),
            "5min" => Ok(Self::FiveMinutes),
            "15min" => Ok(Self::FifteenMinutes),
            "30min" => Ok(Self::ThirtyMinutes),
            "60min" => Ok(Self::SixtyMinutes),
            _ => Err(IntervalParseError(s.to_string())),
        }
    }
}

impl TryFrom<String> for IntradayInterval {
    type Error = IntervalParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<IntradayInterval> for String {
    fn from(value: IntradayInterval) -> Self {
        value.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_names_case_insensitively() {
        assert_eq!("5min".parse(), Ok(IntradayInterval::FiveMinutes));
        assert_eq!(" 60MIN ".parse(), Ok(IntradayInterval::SixtyMinutes));
        assert!("2min".parse::<IntradayInterval>().is_err());
    }

    #[test]
    fn step_matches_width() {
        assert_eq!(IntradayInterval::FiveMinutes.step(), Duration::minutes(5));
        assert_eq!(IntradayInterval::default(), IntradayInterval::FiveMinutes);
    }
}
