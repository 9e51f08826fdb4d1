//! Data categories and their associated policies.
//!
//! [`SeriesKind`] names every category the engine stores. Behaviour that
//! depends on the category (freshness rule, rollup resolution, walk step)
//! is selected with a `match` here rather than spread across callers.

use std::{fmt, str::FromStr};

use chrono::{Duration, NaiveDate};
use market_data_ingestor::models::interval::IntradayInterval;
use serde::{Deserialize, Serialize};

use crate::error::InvalidArgument;
use crate::rollup::bucket;

/// Every stored category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    /// Company profile and financials.
    Overview,
    /// Daily OHLCV bars.
    Daily,
    /// Intraday OHLCV bars at the source's native interval.
    Intraday,
    /// Weekly averages of daily bars.
    Weekly,
    /// Monthly averages of daily bars.
    Monthly,
    /// Yearly averages of daily bars.
    Yearly,
}

/// How [`crate::freshness::FreshnessOracle`] decides a category is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreshnessRule {
    /// Fresh while `last_refreshed` is within the configured max age
    /// (7 days by default).
    MaxAge,
    /// Fresh when the newest row was written since local midnight.
    SinceLocalMidnight,
    /// Never fresh.
    AlwaysStale,
    /// Fresh when the rollup was computed after the last daily write.
    AfterDailyRefresh,
}

impl SeriesKind {
    /// All kinds, in sync order.
    pub const ALL: [SeriesKind; 6] = [
        SeriesKind::Overview,
        SeriesKind::Daily,
        SeriesKind::Intraday,
        SeriesKind::Weekly,
        SeriesKind::Monthly,
        SeriesKind::Yearly,
    ];

    /// Lowercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            SeriesKind::Overview => "overview",
            SeriesKind::Daily => "daily",
            SeriesKind::Intraday => "intraday",
            SeriesKind::Weekly => "weekly",
            SeriesKind::Monthly => "monthly",
            SeriesKind::Yearly => "yearly",
        }
    }

    /// The staleness rule for this kind.
    pub fn freshness_rule(self) -> FreshnessRule {
        match self {
            SeriesKind::Overview => FreshnessRule::MaxAge,
            SeriesKind::Daily => FreshnessRule::SinceLocalMidnight,
            SeriesKind::Intraday => FreshnessRule::AlwaysStale,
            SeriesKind::Weekly | SeriesKind::Monthly | SeriesKind::Yearly => {
                FreshnessRule::AfterDailyRefresh
            }
        }
    }

    /// `Some` for the derived kinds only.
    pub fn resolution(self) -> Option<Resolution> {
        match self {
            SeriesKind::Weekly => Some(Resolution::Weekly),
            SeriesKind::Monthly => Some(Resolution::Monthly),
            SeriesKind::Yearly => Some(Resolution::Yearly),
            _ => None,
        }
    }

    /// Whether the ingestion engine fetches this kind from the source.
    pub fn is_ingested(self) -> bool {
        matches!(
            self,
            SeriesKind::Overview | SeriesKind::Daily | SeriesKind::Intraday
        )
    }

    /// Distance between adjacent bars, used by the consecutive-match walk.
    pub fn bar_granularity(self, interval: IntradayInterval) -> Option<Duration> {
        match self {
            SeriesKind::Daily => Some(Duration::days(1)),
            SeriesKind::Intraday => Some(interval.step()),
            _ => None,
        }
    }
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeriesKind {
    type Err = InvalidArgument;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        SeriesKind::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| InvalidArgument::new(format!("unknown series kind '{s}'")))
    }
}

/// Aggregation granularity of a rollup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    /// ISO weeks, anchored on Monday.
    Weekly,
    /// Calendar months, anchored on the 1st.
    Monthly,
    /// Calendar years, anchored on January 1st.
    Yearly,
}

impl Resolution {
    /// All resolutions.
    pub const ALL: [Resolution; 3] = [Resolution::Weekly, Resolution::Monthly, Resolution::Yearly];

    /// The matching [`SeriesKind`].
    pub fn kind(self) -> SeriesKind {
        match self {
            Resolution::Weekly => SeriesKind::Weekly,
            Resolution::Monthly => SeriesKind::Monthly,
            Resolution::Yearly => SeriesKind::Yearly,
        }
    }

    /// First day of the bucket holding `date`.
    pub fn anchor(self, date: NaiveDate) -> NaiveDate {
        bucket::anchor(self, date)
    }

    /// Grouping key of the bucket holding `date`.
    pub fn bucket_key(self, date: NaiveDate) -> bucket::BucketKey {
        bucket::bucket_key(self, date)
    }

    /// Inclusive date range read when recomputing `year`.
    pub fn year_window(self, year: i32) -> Option<(NaiveDate, NaiveDate)> {
        bucket::year_window(self, year)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind().fmt(f)
    }
}

impl FromStr for Resolution {
    type Err = InvalidArgument;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<SeriesKind>()
            .ok()
            .and_then(SeriesKind::resolution)
            .ok_or_else(|| InvalidArgument::new(format!("unknown resolution '{s}'")))
    }
}
