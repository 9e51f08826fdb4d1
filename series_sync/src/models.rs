//! Diesel models mapping to the database schema.
//!
//! These types mirror the tables defined in the embedded migrations and in
//! [`crate::schema`] for use with Diesel's Queryable/Insertable APIs:
//! - [`crate::schema::overview`]: one profile/financials row per symbol
//! - [`crate::schema::daily_bars`] / [`crate::schema::intraday_bars`]: canonical bars
//! - [`crate::schema::weekly_averages`], [`crate::schema::monthly_averages`],
//!   [`crate::schema::yearly_averages`]: derived rollups
//!
//! Every `last_refreshed` is a naive timestamp interpreted as UTC.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

use crate::schema::*;

/// A row in [`crate::schema::overview`].
///
/// `treat_none_as_null` makes an upsert overwrite stale values with `NULL`
/// when the vendor stops reporting a field.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = overview, check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(primary_key(symbol), treat_none_as_null = true)]
pub struct OverviewRow {
    /// Ticker, primary key.
    pub symbol: String,
    /// Company name.
    pub name: Option<String>,
    /// e.g. "Common Stock".
    pub asset_type: Option<String>,
    /// Free-form business description.
    pub description: Option<String>,
    /// Listing exchange code.
    pub exchange: Option<String>,
    /// Reporting currency.
    pub currency: Option<String>,
    /// Country of domicile.
    pub country: Option<String>,
    /// Sector classification.
    pub sector: Option<String>,
    /// Industry classification.
    pub industry: Option<String>,
    /// Fiscal year end month, as reported (e.g. "December").
    pub fiscal_year_end: Option<String>,
    /// End date of the latest reported quarter.
    pub latest_quarter: Option<NaiveDate>,
    /// Market capitalization in reporting currency units.
    pub market_capitalization: Option<i64>,
    /// EBITDA.
    pub ebitda: Option<f64>,
    /// Price/earnings ratio.
    pub pe_ratio: Option<f64>,
    /// PEG ratio.
    pub peg_ratio: Option<f64>,
    /// Earnings per share.
    pub earnings_per_share: Option<f64>,
    /// Revenue per share, trailing twelve months.
    pub revenue_per_share_ttm: Option<f64>,
    /// Profit margin.
    pub profit_margin: Option<f64>,
    /// Operating margin, trailing twelve months.
    pub operating_margin_ttm: Option<f64>,
    /// Return on assets, trailing twelve months.
    pub return_on_assets_ttm: Option<f64>,
    /// Return on equity, trailing twelve months.
    pub return_on_equity_ttm: Option<f64>,
    /// Revenue, trailing twelve months.
    pub revenue_ttm: Option<f64>,
    /// Gross profit, trailing twelve months.
    pub gross_profit_ttm: Option<f64>,
    /// Quarterly earnings growth, year over year.
    pub quarterly_earnings_growth_yoy: Option<f64>,
    /// Quarterly revenue growth, year over year.
    pub quarterly_revenue_growth_yoy: Option<f64>,
    /// 52-week high.
    pub week_52_high: Option<f64>,
    /// 52-week low.
    pub week_52_low: Option<f64>,
    /// When this row was last written (UTC).
    pub last_refreshed: NaiveDateTime,
}

/// A row in [`crate::schema::daily_bars`].
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = daily_bars, check_for_backend(diesel::sqlite::Sqlite))]
pub struct DailyBarRow {
    /// Ticker.
    pub symbol: String,
    /// Trading day.
    pub date: NaiveDate,
    /// Opening price.
    pub open: Option<f64>,
    /// Highest price.
    pub high: Option<f64>,
    /// Lowest price.
    pub low: Option<f64>,
    /// Closing price.
    pub close: Option<f64>,
    /// Traded volume.
    pub volume: Option<f64>,
    /// When this row was written (UTC).
    pub last_refreshed: NaiveDateTime,
}

/// A row in [`crate::schema::intraday_bars`].
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = intraday_bars, check_for_backend(diesel::sqlite::Sqlite))]
pub struct IntradayBarRow {
    /// Ticker.
    pub symbol: String,
    /// Bar start, UTC.
    pub ts: NaiveDateTime,
    /// Opening price.
    pub open: Option<f64>,
    /// Highest price.
    pub high: Option<f64>,
    /// Lowest price.
    pub low: Option<f64>,
    /// Closing price.
    pub close: Option<f64>,
    /// Traded volume.
    pub volume: Option<f64>,
    /// When this row was written (UTC).
    pub last_refreshed: NaiveDateTime,
}

/// A row in any of the three rollup tables; they share one layout.
///
/// Loaded with an explicit column tuple, so field order matters.
#[derive(Debug, Clone, PartialEq, Queryable)]
pub struct AggregateRow {
    /// Ticker.
    pub symbol: String,
    /// Bucket anchor: Monday, 1st of month, or January 1st.
    pub anchor: NaiveDate,
    /// Mean opening price.
    pub open: Option<f64>,
    /// Mean high.
    pub high: Option<f64>,
    /// Mean low.
    pub low: Option<f64>,
    /// Mean close.
    pub close: Option<f64>,
    /// Mean volume.
    pub volume: Option<f64>,
    /// When this bucket was last computed (UTC).
    pub last_refreshed: NaiveDateTime,
}
