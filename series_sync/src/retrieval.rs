//! Retrieval facade: make sure the data is current, then read it in a
//! uniform shape.
//!
//! - daily / intraday: sync when stale, read every bar ascending
//! - weekly / monthly / yearly: sync daily when stale, recompute the rollup
//!   when it lags the daily series, read every bucket ascending
//! - overview: sync when stale, read the single row
//!
//! Nulls become `0.0` in [`SeriesPoint`]; dates become unix seconds at UTC
//! midnight.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use diesel::SqliteConnection;
use market_data_ingestor::providers::TimeSeriesSource;
use serde::Serialize;
use tracing::instrument;

use crate::error::{InvalidArgument, RetrievalError};
use crate::ingest::Ingestor;
use crate::kind::SeriesKind;
use crate::models::{AggregateRow, DailyBarRow, IntradayBarRow, OverviewRow};
use crate::rollup::refresh_rollup;
use crate::store::{bars, overview, rollups};
use crate::symbol::Symbol;

const LAST_REFRESHED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One observation in presentation form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// Ticker.
    pub symbol: String,
    /// Bar or bucket start, unix seconds (UTC).
    pub timestamp: i64,
    /// Opening price, `0.0` when unknown.
    pub open: f64,
    /// High, `0.0` when unknown.
    pub high: f64,
    /// Low, `0.0` when unknown.
    pub low: f64,
    /// Close, `0.0` when unknown.
    pub close: f64,
    /// Volume, `0.0` when unknown.
    pub volume: f64,
    /// When the row was written, `YYYY-MM-DD HH:MM:SS` UTC.
    pub last_refreshed: String,
}

impl SeriesPoint {
    #[allow(clippy::too_many_arguments)]
    fn new(
        symbol: &str,
        timestamp: i64,
        open: Option<f64>,
        high: Option<f64>,
        low: Option<f64>,
        close: Option<f64>,
        volume: Option<f64>,
        last_refreshed: NaiveDateTime,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            timestamp,
            open: open.unwrap_or_default(),
            high: high.unwrap_or_default(),
            low: low.unwrap_or_default(),
            close: close.unwrap_or_default(),
            volume: volume.unwrap_or_default(),
            last_refreshed: format_refreshed(last_refreshed),
        }
    }
}

fn date_seconds(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

fn format_refreshed(ts: NaiveDateTime) -> String {
    ts.format(LAST_REFRESHED_FORMAT).to_string()
}

impl From<&DailyBarRow> for SeriesPoint {
    fn from(r: &DailyBarRow) -> Self {
        Self::new(
            &r.symbol,
            date_seconds(r.date),
            r.open,
            r.high,
            r.low,
            r.close,
            r.volume,
            r.last_refreshed,
        )
    }
}

impl From<&IntradayBarRow> for SeriesPoint {
    fn from(r: &IntradayBarRow) -> Self {
        Self::new(
            &r.symbol,
            r.ts.and_utc().timestamp(),
            r.open,
            r.high,
            r.low,
            r.close,
            r.volume,
            r.last_refreshed,
        )
    }
}

impl From<&AggregateRow> for SeriesPoint {
    fn from(r: &AggregateRow) -> Self {
        Self::new(
            &r.symbol,
            date_seconds(r.anchor),
            r.open,
            r.high,
            r.low,
            r.close,
            r.volume,
            r.last_refreshed,
        )
    }
}

/// Company profile and financials, every field by name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[allow(missing_docs)]
pub struct CompanyOverview {
    pub symbol: String,
    pub name: Option<String>,
    pub asset_type: Option<String>,
    pub description: Option<String>,
    pub exchange: Option<String>,
    pub currency: Option<String>,
    pub country: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub fiscal_year_end: Option<String>,
    pub latest_quarter: Option<NaiveDate>,
    pub market_capitalization: Option<i64>,
    pub ebitda: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub earnings_per_share: Option<f64>,
    pub revenue_per_share_ttm: Option<f64>,
    pub profit_margin: Option<f64>,
    pub operating_margin_ttm: Option<f64>,
    pub return_on_assets_ttm: Option<f64>,
    pub return_on_equity_ttm: Option<f64>,
    pub revenue_ttm: Option<f64>,
    pub gross_profit_ttm: Option<f64>,
    pub quarterly_earnings_growth_yoy: Option<f64>,
    pub quarterly_revenue_growth_yoy: Option<f64>,
    pub week_52_high: Option<f64>,
    pub week_52_low: Option<f64>,
    pub last_refreshed: String,
}

impl From<OverviewRow> for CompanyOverview {
    fn from(r: OverviewRow) -> Self {
        Self {
            symbol: r.symbol,
            name: r.name,
            asset_type: r.asset_type,
            description: r.description,
            exchange: r.exchange,
            currency: r.currency,
            country: r.country,
            sector: r.sector,
            industry: r.industry,
            fiscal_year_end: r.fiscal_year_end,
            latest_quarter: r.latest_quarter,
            market_capitalization: r.market_capitalization,
            ebitda: r.ebitda,
            pe_ratio: r.pe_ratio,
            peg_ratio: r.peg_ratio,
            earnings_per_share: r.earnings_per_share,
            revenue_per_share_ttm: r.revenue_per_share_ttm,
            profit_margin: r.profit_margin,
            operating_margin_ttm: r.operating_margin_ttm,
            return_on_assets_ttm: r.return_on_assets_ttm,
            return_on_equity_ttm: r.return_on_equity_ttm,
            revenue_ttm: r.revenue_ttm,
            gross_profit_ttm: r.gross_profit_ttm,
            quarterly_earnings_growth_yoy: r.quarterly_earnings_growth_yoy,
            quarterly_revenue_growth_yoy: r.quarterly_revenue_growth_yoy,
            week_52_high: r.week_52_high,
            week_52_low: r.week_52_low,
            last_refreshed: format_refreshed(r.last_refreshed),
        }
    }
}

/// Result of [`Retrieval::get`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Retrieved {
    /// The overview record.
    Overview(Box<CompanyOverview>),
    /// Bars or buckets, oldest first.
    Series(Vec<SeriesPoint>),
}

/// "Ensure fresh, then read" entry point.
pub struct Retrieval<S> {
    ingestor: Ingestor<S>,
}

impl<S> Retrieval<S>
where
    S: TimeSeriesSource + Send + Sync,
{
    /// Facade over an ingestor; its oracle and clock are reused for rollups.
    pub fn new(ingestor: Ingestor<S>) -> Self {
        Self { ingestor }
    }

    /// The wrapped ingestor.
    pub fn ingestor(&self) -> &Ingestor<S> {
        &self.ingestor
    }

    /// Any kind: the overview or a series.
    pub async fn get(
        &mut self,
        conn: &mut SqliteConnection,
        symbol: &Symbol,
        kind: SeriesKind,
    ) -> Result<Retrieved, RetrievalError> {
        match kind {
            SeriesKind::Overview => self
                .get_overview(conn, symbol)
                .await
                .map(|o| Retrieved::Overview(Box::new(o))),
            _ => self.get_series(conn, symbol, kind).await.map(Retrieved::Series),
        }
    }

    /// Bars or rollup buckets for `symbol`, oldest first.
    #[instrument(skip_all, fields(symbol = %symbol, kind = %kind))]
    pub async fn get_series(
        &mut self,
        conn: &mut SqliteConnection,
        symbol: &Symbol,
        kind: SeriesKind,
    ) -> Result<Vec<SeriesPoint>, RetrievalError> {
        let sym = symbol.as_str();
        let read_err = |source| RetrievalError::Storage {
            symbol: sym.to_string(),
            kind,
            source,
        };

        match kind {
            SeriesKind::Overview => Err(InvalidArgument::new(
                "overview is not a series; use get_overview",
            )
            .into()),
            SeriesKind::Daily => {
                self.ingestor.sync(conn, symbol, kind).await?;
                let rows = bars::load_daily(conn, sym).map_err(read_err)?;
                Ok(rows.iter().map(SeriesPoint::from).collect())
            }
            SeriesKind::Intraday => {
                self.ingestor.sync(conn, symbol, kind).await?;
                let rows = bars::load_intraday(conn, sym).map_err(read_err)?;
                Ok(rows.iter().map(SeriesPoint::from).collect())
            }
            SeriesKind::Weekly | SeriesKind::Monthly | SeriesKind::Yearly => {
                let Some(resolution) = kind.resolution() else {
                    return Err(InvalidArgument::new(format!("'{kind}' has no resolution")).into());
                };
                self.ingestor.sync(conn, symbol, SeriesKind::Daily).await?;

                let oracle = self.ingestor.oracle();
                if !oracle.is_fresh(conn, sym, kind) {
                    refresh_rollup(conn, symbol, resolution, oracle.clock().as_ref())?;
                }
                let rows = rollups::load_aggregates(conn, resolution, sym).map_err(read_err)?;
                Ok(rows.iter().map(SeriesPoint::from).collect())
            }
        }
    }

    /// The overview record, synced first when stale.
    #[instrument(skip_all, fields(symbol = %symbol))]
    pub async fn get_overview(
        &mut self,
        conn: &mut SqliteConnection,
        symbol: &Symbol,
    ) -> Result<CompanyOverview, RetrievalError> {
        self.ingestor.sync(conn, symbol, SeriesKind::Overview).await?;

        let row = overview::find_overview(conn, symbol.as_str()).map_err(|source| {
            RetrievalError::Storage {
                symbol: symbol.to_string(),
                kind: SeriesKind::Overview,
                source,
            }
        })?;
        row.map(CompanyOverview::from)
            .ok_or_else(|| RetrievalError::NotFound {
                symbol: symbol.to_string(),
                kind: SeriesKind::Overview,
            })
    }
}
