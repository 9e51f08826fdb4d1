//! Ingestion engine: fetch when stale, then merge into the bar store.
//!
//! ## Flow
//! 1. Ask the [`FreshnessOracle`]; a fresh category is skipped without any
//!    upstream call.
//! 2. Count the call against the [`CallBudget`] and fetch.
//! 3. Coerce every record. Records whose key cannot be read are dropped.
//! 4. Overview: one upsert. Bars: the consecutive-match walk, committing
//!    every `batch_size` staged rows in its own transaction.
//!
//! Existing bars are never rewritten, so repeating a sync with the same
//! upstream data leaves the store unchanged.
//!
//! ## Failures
//! A fetch error aborts the sync before any write. A storage error rolls back
//! the in-flight batch only; earlier batches stay committed.

mod budget;
mod overview;
mod walk;

pub use budget::{BudgetWarning, CallBudget};

use diesel::{Connection, SqliteConnection};
use market_data_ingestor::models::{bar::RawBar, interval::IntradayInterval};
use market_data_ingestor::providers::TimeSeriesSource;
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::coerce;
use crate::error::{InvalidArgument, SyncError};
use crate::freshness::FreshnessOracle;
use crate::kind::SeriesKind;
use crate::models::{DailyBarRow, IntradayBarRow};
use crate::store;
use crate::symbol::Symbol;
use walk::{BarTable, DailyTable, IntradayTable, WalkSettings, WalkStats};

/// Knobs for the merge walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestSettings {
    /// Staged rows per transaction.
    pub batch_size: usize,
    /// Consecutive stored daily bars that end a walk.
    pub daily_match_threshold: u32,
    /// Consecutive stored intraday bars that end a walk.
    pub intraday_match_threshold: u32,
    /// Native interval requested for intraday bars.
    pub intraday_interval: IntradayInterval,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            batch_size: 500,
            daily_match_threshold: 30,
            // Three sessions of 5-minute bars.
            intraday_match_threshold: 288,
            intraday_interval: IntradayInterval::FiveMinutes,
        }
    }
}

/// Outcome of one [`Ingestor::sync`] call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    /// Symbol synced.
    pub symbol: String,
    /// Category synced.
    pub kind: SeriesKind,
    /// `true` when the data was fresh and nothing was fetched.
    pub skipped: bool,
    /// Records returned by the source.
    pub fetched: usize,
    /// Records dropped because their key could not be read.
    pub rejected: usize,
    /// Records examined by the walk.
    pub visited: usize,
    /// Rows written (overview: 1 when the row was written).
    pub inserted: usize,
    /// Records already present in the store.
    pub existing_seen: usize,
    /// Whether the consecutive-match threshold ended the walk.
    pub stopped_early: bool,
    /// Transactions committed.
    pub batches_committed: usize,
    /// Set when this sync's upstream call crossed a budget threshold.
    pub budget_warning: Option<BudgetWarning>,
}

impl SyncReport {
    fn new(symbol: &Symbol, kind: SeriesKind) -> Self {
        Self {
            symbol: symbol.to_string(),
            kind,
            skipped: false,
            fetched: 0,
            rejected: 0,
            visited: 0,
            inserted: 0,
            existing_seen: 0,
            stopped_early: false,
            batches_committed: 0,
            budget_warning: None,
        }
    }

    fn absorb(&mut self, stats: &WalkStats) {
        self.visited = stats.visited;
        self.inserted = stats.inserted;
        self.existing_seen = stats.existing_seen;
        self.stopped_early = stats.stopped_early;
        self.batches_committed = stats.batches_committed;
    }
}

/// Pulls categories from a [`TimeSeriesSource`] into the store.
///
/// Owns the call budget, so one instance should serve a whole process run.
pub struct Ingestor<S> {
    source: S,
    oracle: FreshnessOracle,
    budget: CallBudget,
    settings: IngestSettings,
}

impl<S> Ingestor<S>
where
    S: TimeSeriesSource + Send + Sync,
{
    /// Ingestor with the default budget.
    pub fn new(source: S, oracle: FreshnessOracle, settings: IngestSettings) -> Self {
        Self {
            source,
            oracle,
            budget: CallBudget::default(),
            settings,
        }
    }

    /// Replaces the call budget.
    pub fn with_budget(mut self, budget: CallBudget) -> Self {
        self.budget = budget;
        self
    }

    /// The wrapped source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The oracle consulted before each fetch.
    pub fn oracle(&self) -> &FreshnessOracle {
        &self.oracle
    }

    /// Calls counted so far.
    pub fn budget(&self) -> &CallBudget {
        &self.budget
    }

    /// Active settings.
    pub fn settings(&self) -> &IngestSettings {
        &self.settings
    }

    /// Fetches `kind` for `symbol` when stale, then merges it.
    #[instrument(skip_all, fields(symbol = %symbol, kind = %kind))]
    pub async fn sync(
        &mut self,
        conn: &mut SqliteConnection,
        symbol: &Symbol,
        kind: SeriesKind,
    ) -> Result<SyncReport, SyncError> {
        ensure_ingested(kind)?;
        if self.oracle.is_fresh(conn, symbol.as_str(), kind) {
            info!("data is fresh; skipping fetch");
            let mut report = SyncReport::new(symbol, kind);
            report.skipped = true;
            return Ok(report);
        }
        self.run(conn, symbol, kind).await
    }

    /// Like [`Ingestor::sync`] but never consults the oracle.
    #[instrument(skip_all, fields(symbol = %symbol, kind = %kind))]
    pub async fn sync_forced(
        &mut self,
        conn: &mut SqliteConnection,
        symbol: &Symbol,
        kind: SeriesKind,
    ) -> Result<SyncReport, SyncError> {
        ensure_ingested(kind)?;
        self.run(conn, symbol, kind).await
    }

    /// Syncs overview, daily and intraday in that order. A failed category
    /// does not stop the next one.
    pub async fn sync_all(
        &mut self,
        conn: &mut SqliteConnection,
        symbol: &Symbol,
    ) -> Vec<(SeriesKind, Result<SyncReport, SyncError>)> {
        let mut outcomes = Vec::with_capacity(3);
        for kind in [SeriesKind::Overview, SeriesKind::Daily, SeriesKind::Intraday] {
            let outcome = self.sync(conn, symbol, kind).await;
            if let Err(e) = &outcome {
                error!(%symbol, %kind, error = %e, "sync failed; continuing");
            }
            outcomes.push((kind, outcome));
        }
        outcomes
    }

    async fn run(
        &mut self,
        conn: &mut SqliteConnection,
        symbol: &Symbol,
        kind: SeriesKind,
    ) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::new(symbol, kind);
        report.budget_warning = self.budget.record_call();
        if let Some(w) = report.budget_warning {
            warn!(
                calls_made = w.calls_made,
                remaining = w.remaining,
                "API call budget running low"
            );
        }

        let now = self.oracle.now().naive_utc();
        let source_err = |source| SyncError::Source {
            symbol: symbol.to_string(),
            kind,
            source,
        };

        match kind {
            SeriesKind::Overview => {
                let raw = self
                    .source
                    .fetch_overview(symbol.as_str())
                    .await
                    .map_err(source_err)?;
                report.fetched = raw.0.len();
                if raw.is_empty() {
                    warn!("source returned an empty overview; nothing written");
                    return Ok(report);
                }

                let row = overview::overview_row(symbol.as_str(), &raw, now);
                conn.immediate_transaction(|conn| store::overview::upsert_overview(conn, &row))
                    .map_err(|e| {
                        error!(error = %e, "overview upsert rolled back");
                        SyncError::from_db(symbol.as_str(), kind, e)
                    })?;
                report.inserted = 1;
                report.batches_committed = 1;
            }
            SeriesKind::Daily => {
                let raw = self
                    .source
                    .fetch_daily(symbol.as_str())
                    .await
                    .map_err(source_err)?;
                report.fetched = raw.len();
                let rows = daily_rows(symbol, raw, now);
                report.rejected = report.fetched - rows.len();
                self.walk::<DailyTable>(conn, symbol, kind, rows, &mut report)?;
            }
            SeriesKind::Intraday => {
                let raw = self
                    .source
                    .fetch_intraday(symbol.as_str(), self.settings.intraday_interval)
                    .await
                    .map_err(source_err)?;
                report.fetched = raw.len();
                let rows = intraday_rows(symbol, raw, now);
                report.rejected = report.fetched - rows.len();
                self.walk::<IntradayTable>(conn, symbol, kind, rows, &mut report)?;
            }
            other => return Err(not_ingested(other).into()),
        }

        info!(
            fetched = report.fetched,
            inserted = report.inserted,
            existing_seen = report.existing_seen,
            stopped_early = report.stopped_early,
            "sync complete"
        );
        Ok(report)
    }

    fn walk<T: BarTable>(
        &self,
        conn: &mut SqliteConnection,
        symbol: &Symbol,
        kind: SeriesKind,
        rows: Vec<T::Row>,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        let threshold = match kind {
            SeriesKind::Intraday => self.settings.intraday_match_threshold,
            _ => self.settings.daily_match_threshold,
        };
        let Some(step) = kind.bar_granularity(self.settings.intraday_interval) else {
            return Err(not_ingested(kind).into());
        };
        let settings = WalkSettings {
            step,
            threshold,
            batch_size: self.settings.batch_size,
        };

        match walk::merge::<T>(conn, symbol.as_str(), rows, settings) {
            Ok(stats) => {
                report.absorb(&stats);
                Ok(())
            }
            Err(failure) => {
                report.absorb(&failure.stats);
                error!(
                    committed_batches = failure.stats.batches_committed,
                    inserted = failure.stats.inserted,
                    error = %failure.source,
                    "batch rolled back"
                );
                Err(SyncError::from_db(symbol.as_str(), kind, failure.source))
            }
        }
    }
}

fn ensure_ingested(kind: SeriesKind) -> Result<(), SyncError> {
    if kind.is_ingested() {
        Ok(())
    } else {
        Err(not_ingested(kind).into())
    }
}

fn not_ingested(kind: SeriesKind) -> InvalidArgument {
    InvalidArgument::new(format!(
        "'{kind}' is derived and cannot be synced; expected overview, daily or intraday"
    ))
}

fn daily_rows(symbol: &Symbol, raw: Vec<RawBar>, now: chrono::NaiveDateTime) -> Vec<DailyBarRow> {
    raw.into_iter()
        .filter_map(|bar| {
            let Some(date) = coerce::date_key(&bar.timestamp) else {
                warn!(%symbol, timestamp = %bar.timestamp, "dropping daily record with unreadable date");
                return None;
            };
            Some(DailyBarRow {
                symbol: symbol.to_string(),
                date,
                open: coerce::number(&bar.open),
                high: coerce::number(&bar.high),
                low: coerce::number(&bar.low),
                close: coerce::number(&bar.close),
                volume: coerce::number(&bar.volume),
                last_refreshed: now,
            })
        })
        .collect()
}

fn intraday_rows(
    symbol: &Symbol,
    raw: Vec<RawBar>,
    now: chrono::NaiveDateTime,
) -> Vec<IntradayBarRow> {
    raw.into_iter()
        .filter_map(|bar| {
            let Some(ts) = coerce::timestamp_key(&bar.timestamp) else {
                warn!(%symbol, timestamp = %bar.timestamp, "dropping intraday record with unreadable timestamp");
                return None;
            };
            Some(IntradayBarRow {
                symbol: symbol.to_string(),
                ts,
                open: coerce::number(&bar.open),
                high: coerce::number(&bar.high),
                low: coerce::number(&bar.low),
                close: coerce::number(&bar.close),
                volume: coerce::number(&bar.volume),
                last_refreshed: now,
            })
        })
        .collect()
}
