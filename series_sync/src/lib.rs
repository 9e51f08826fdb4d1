//! Local time-series store kept in step with a remote market-data source.
//!
//! The crate pulls company overviews, daily bars and intraday bars through a
//! [`TimeSeriesSource`](market_data_ingestor::providers::TimeSeriesSource),
//! merges them into SQLite without re-writing history, derives weekly,
//! monthly and yearly averages from the daily bars, and serves everything
//! back through [`retrieval::Retrieval`].
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use market_data_ingestor::providers::alpha_vantage::AlphaVantageProvider;
//! use series_sync::{
//!     db, freshness::FreshnessOracle, ingest::{IngestSettings, Ingestor},
//!     kind::SeriesKind, retrieval::Retrieval, symbol::Symbol,
//! };
//!
//! db::migrate::run_all("series.db")?;
//! let mut conn = db::connection::connect_sqlite("series.db")?;
//! let ingestor = Ingestor::new(
//!     AlphaVantageProvider::new()?,
//!     FreshnessOracle::default(),
//!     IngestSettings::default(),
//! );
//! let mut retrieval = Retrieval::new(ingestor);
//! let ibm = Symbol::parse("IBM")?;
//! let weekly = retrieval.get_series(&mut conn, &ibm, SeriesKind::Weekly).await?;
//! # let _ = weekly;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod clock;
pub mod coerce;
pub mod config;
pub mod db;
pub mod error;
pub mod freshness;
pub mod ingest;
pub mod kind;
pub mod models;
pub mod retrieval;
pub mod rollup;
pub mod schema;
pub mod store;
pub mod symbol;

pub use error::{InvalidArgument, RetrievalError, RollupError, SyncError};
pub use kind::{Resolution, SeriesKind};
pub use symbol::Symbol;
