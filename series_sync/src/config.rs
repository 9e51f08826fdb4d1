//! Engine configuration: parsing, validation, and loading.
//!
//! A TOML file with five optional sections. Every key has a default, so an
//! empty file is a valid configuration:
//!
//! ```toml
//! [database]
//! url = "series.db"
//!
//! [source]
//! api_key_env = "ALPHAVANTAGE_API_KEY"
//! intraday_interval = "5min"
//! requests_per_minute = 5
//!
//! [budget]
//! daily_allowance = 25
//! warn_at = [10, 20]
//!
//! [ingest]
//! batch_size = 500
//! daily_match_threshold = 30
//! intraday_match_threshold = 288
//!
//! [freshness]
//! overview_max_age_days = 7
//! timezone = "America/New_York"   # host zone when absent
//! ```
//!
//! Entrypoints:
//! - Parse + validate from a TOML string: [`load_config_str`]
//! - Parse + validate from a file path: [`load_config_path`]

use std::path::PathBuf;

use market_data_ingestor::models::interval::IntradayInterval;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::LocalZone;
use crate::freshness::FreshnessPolicy;
use crate::ingest::{CallBudget, IngestSettings};

/// Why a configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("read config file {path}: {source}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// I/O failure.
        source: std::io::Error,
    },
    /// The TOML is malformed or has unknown keys.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// Storage location.
    pub database: DatabaseCfg,
    /// Upstream source.
    pub source: SourceCfg,
    /// Call accounting.
    pub budget: BudgetCfg,
    /// Merge walk.
    pub ingest: IngestCfg,
    /// Staleness rules.
    pub freshness: FreshnessCfg,
}

/// `[database]`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct DatabaseCfg {
    /// SQLite path or `sqlite:` URL. `DATABASE_URL` wins when set.
    pub url: String,
}

impl Default for DatabaseCfg {
    fn default() -> Self {
        Self {
            url: "series.db".into(),
        }
    }
}

/// `[source]`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct SourceCfg {
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Intraday bar width requested from the source.
    pub intraday_interval: IntradayInterval,
    /// Client-side pacing; `0` disables it.
    pub requests_per_minute: u32,
}

impl Default for SourceCfg {
    fn default() -> Self {
        Self {
            api_key_env: "ALPHAVANTAGE_API_KEY".into(),
            intraday_interval: IntradayInterval::FiveMinutes,
            requests_per_minute: 5,
        }
    }
}

/// `[budget]`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct BudgetCfg {
    /// Calls allowed per day.
    pub daily_allowance: u32,
    /// Call counts that trigger a warning.
    pub warn_at: Vec<u32>,
}

impl Default for BudgetCfg {
    fn default() -> Self {
        Self {
            daily_allowance: 25,
            warn_at: vec![10, 20],
        }
    }
}

/// `[ingest]`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct IngestCfg {
    /// Rows per transaction.
    pub batch_size: usize,
    /// Consecutive stored daily bars that end a walk.
    pub daily_match_threshold: u32,
    /// Consecutive stored intraday bars that end a walk.
    pub intraday_match_threshold: u32,
}

impl Default for IngestCfg {
    fn default() -> Self {
        let d = IngestSettings::default();
        Self {
            batch_size: d.batch_size,
            daily_match_threshold: d.daily_match_threshold,
            intraday_match_threshold: d.intraday_match_threshold,
        }
    }
}

/// `[freshness]`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct FreshnessCfg {
    /// Days an overview row stays fresh.
    pub overview_max_age_days: u32,
    /// IANA zone for the daily boundary; host zone when absent.
    pub timezone: Option<String>,
}

impl Default for FreshnessCfg {
    fn default() -> Self {
        Self {
            overview_max_age_days: 7,
            timezone: None,
        }
    }
}

impl Config {
    /// Walk settings derived from `[ingest]` and `[source]`.
    pub fn ingest_settings(&self) -> IngestSettings {
        IngestSettings {
            batch_size: self.ingest.batch_size,
            daily_match_threshold: self.ingest.daily_match_threshold,
            intraday_match_threshold: self.ingest.intraday_match_threshold,
            intraday_interval: self.source.intraday_interval,
        }
    }

    /// A fresh budget from `[budget]`.
    pub fn call_budget(&self) -> CallBudget {
        CallBudget::new(self.budget.daily_allowance, self.budget.warn_at.clone())
    }

    /// Freshness policy from `[freshness]`.
    pub fn freshness_policy(&self) -> Result<FreshnessPolicy, ConfigError> {
        let zone = match &self.freshness.timezone {
            Some(name) => name
                .parse::<LocalZone>()
                .map_err(|e| ConfigError::Invalid(e.0))?,
            None => LocalZone::Host,
        };
        Ok(FreshnessPolicy {
            overview_max_age: chrono::Duration::days(i64::from(self.freshness.overview_max_age_days)),
            zone,
        })
    }
}

/// Longest overview freshness window accepted (about a century).
pub const MAX_OVERVIEW_AGE_DAYS: u32 = 36_500;

/// Normalize a configuration in place and reject values the engine cannot
/// run with.
///
/// What normalization does:
/// - Trims `database.url`, `source.api_key_env` and `freshness.timezone`
///   (an empty timezone means the host zone)
/// - Sorts and de-duplicates `budget.warn_at`
///
/// Errors:
/// - Empty database URL or API key variable name
/// - Zero batch size or zero match thresholds
/// - `freshness.overview_max_age_days` above [`MAX_OVERVIEW_AGE_DAYS`]
/// - Unknown timezone
pub fn normalize_config(cfg: &mut Config) -> Result<(), ConfigError> {
    cfg.database.url = cfg.database.url.trim().to_string();
    if cfg.database.url.is_empty() {
        return Err(ConfigError::Invalid("database.url cannot be empty".into()));
    }

    cfg.source.api_key_env = cfg.source.api_key_env.trim().to_string();
    if cfg.source.api_key_env.is_empty() {
        return Err(ConfigError::Invalid(
            "source.api_key_env cannot be empty".into(),
        ));
    }

    cfg.budget.warn_at.sort_unstable();
    cfg.budget.warn_at.dedup();

    if cfg.ingest.batch_size == 0 {
        return Err(ConfigError::Invalid("ingest.batch_size must be at least 1".into()));
    }
    if cfg.ingest.daily_match_threshold == 0 || cfg.ingest.intraday_match_threshold == 0 {
        return Err(ConfigError::Invalid(
            "ingest match thresholds must be at least 1".into(),
        ));
    }

    if cfg.freshness.overview_max_age_days > MAX_OVERVIEW_AGE_DAYS {
        return Err(ConfigError::Invalid(format!(
            "freshness.overview_max_age_days must be at most {MAX_OVERVIEW_AGE_DAYS}"
        )));
    }

    cfg.freshness.timezone = cfg
        .freshness
        .timezone
        .take()
        .map(|tz| tz.trim().to_string())
        .filter(|tz| !tz.is_empty());
    cfg.freshness_policy()?;

    Ok(())
}

/// Parse and validate a configuration from a TOML string.
pub fn load_config_str(toml_str: &str) -> Result<Config, ConfigError> {
    let mut cfg: Config = toml::from_str(toml_str)?;
    normalize_config(&mut cfg)?;
    Ok(cfg)
}

/// Read a configuration file from disk, parse, and validate it.
pub fn load_config_path(path: impl AsRef<std::path::Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    load_config_str(&text)
}
