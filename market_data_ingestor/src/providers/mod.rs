//! Provider abstraction for market data sources.
//!
//! This module defines the [`TimeSeriesSource`] trait, the single interface
//! the sync engine uses to pull company overviews, daily bars and intraday
//! bars from a vendor (e.g. Alpha Vantage).
//!
//! The trait is async and object safe, so callers can hold a
//! `Box<dyn TimeSeriesSource + Send + Sync>` picked at runtime.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use market_data_ingestor::models::{
//!     bar::RawBar, interval::IntradayInterval, overview::RawOverview,
//! };
//! use market_data_ingestor::providers::{ProviderError, TimeSeriesSource};
//!
//! struct Empty;
//!
//! #[async_trait]
//! impl TimeSeriesSource for Empty {
//!     async fn fetch_overview(&self, _symbol: &str) -> Result<RawOverview, ProviderError> {
//!         Ok(RawOverview::default())
//!     }
//!     async fn fetch_daily(&self, _symbol: &str) -> Result<Vec<RawBar>, ProviderError> {
//!         Ok(vec![])
//!     }
//!     async fn fetch_intraday(
//!         &self,
//!         _symbol: &str,
//!         _interval: IntradayInterval,
//!     ) -> Result<Vec<RawBar>, ProviderError> {
//!         Ok(vec![])
//!     }
//! }
//! ```

pub mod alpha_vantage;

use async_trait::async_trait;
use shared_utils::env::MissingEnvVarError;
use snafu::{Backtrace, Snafu};

use crate::models::{bar::RawBar, interval::IntradayInterval, overview::RawOverview};

/// Fetch interface for an external time-series vendor.
///
/// Implementations make exactly one upstream request per call and do not
/// retry; a failure is returned to the caller as-is.
#[async_trait]
pub trait TimeSeriesSource {
    /// Fetches the descriptive/financial overview for `symbol`.
    async fn fetch_overview(&self, symbol: &str) -> Result<RawOverview, ProviderError>;

    /// Fetches the full daily history for `symbol`, in no guaranteed order.
    async fn fetch_daily(&self, symbol: &str) -> Result<Vec<RawBar>, ProviderError>;

    /// Fetches intraday bars for `symbol` at the given native interval.
    async fn fetch_intraday(
        &self,
        symbol: &str,
        interval: IntradayInterval,
    ) -> Result<Vec<RawBar>, ProviderError>;
}

#[async_trait]
impl<T> TimeSeriesSource for Box<T>
where
    T: TimeSeriesSource + Send + Sync + ?Sized,
{
    async fn fetch_overview(&self, symbol: &str) -> Result<RawOverview, ProviderError> {
        (**self).fetch_overview(symbol).await
    }

    async fn fetch_daily(&self, symbol: &str) -> Result<Vec<RawBar>, ProviderError> {
        (**self).fetch_daily(symbol).await
    }

    async fn fetch_intraday(
        &self,
        symbol: &str,
        interval: IntradayInterval,
    ) -> Result<Vec<RawBar>, ProviderError> {
        (**self).fetch_intraday(symbol, interval).await
    }
}

/// Errors that can occur during the creation of a provider instance
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// missed environment variable.
    #[snafu(display("Missing environment variable: {source}"))]
    MissingEnvVar {
        source: MissingEnvVarError,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within a `TimeSeriesSource` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// An error during an API request (e.g., network failure, timeout).
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The provider's API returned an error (unknown symbol, quota exhausted,
    /// invalid API key, non-2xx status).
    #[snafu(display("API error: {message}"))]
    Api {
        message: String,
        backtrace: Backtrace,
    },

    /// The response body could not be decoded.
    #[snafu(display("Malformed payload: {source}"))]
    Decode {
        source: serde_json::Error,
        backtrace: Backtrace,
    },

    /// The payload decoded but did not have the expected shape.
    #[snafu(display("Unexpected payload: {message}"))]
    Shape {
        message: String,
        backtrace: Backtrace,
    },

    /// An error during provider configuration or initialization.
    #[snafu(display("Provider initialization error: {source}"))]
    Init {
        #[snafu(backtrace)]
        source: ProviderInitError,
    },
}

impl ProviderError {
    /// Builds an [`ProviderError::Api`] from a message. Handy for fakes.
    pub fn api(message: impl Into<String>) -> Self {
        ApiSnafu {
            message: message.into(),
        }
        .build()
    }

    /// Builds a [`ProviderError::Shape`] from a message.
    pub fn shape(message: impl Into<String>) -> Self {
        ShapeSnafu {
            message: message.into(),
        }
        .build()
    }
}
