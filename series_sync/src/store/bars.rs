//! Daily and intraday bar queries.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::{RunQueryDsl, SqliteConnection, insert_into, select};

use crate::models::{DailyBarRow, IntradayBarRow};
use crate::schema::{daily_bars, intraday_bars};

/// Whether a daily bar exists at exactly `date`.
pub fn daily_exists(
    conn: &mut SqliteConnection,
    symbol: &str,
    date: NaiveDate,
) -> QueryResult<bool> {
    select(exists(
        daily_bars::table
            .filter(daily_bars::symbol.eq(symbol))
            .filter(daily_bars::date.eq(date)),
    ))
    .get_result(conn)
}

/// Plain insert; a duplicate key is a unique violation.
pub fn insert_daily(conn: &mut SqliteConnection, row: &DailyBarRow) -> QueryResult<usize> {
    insert_into(daily_bars::table).values(row).execute(conn)
}

/// Every daily bar for `symbol`, oldest first.
pub fn load_daily(conn: &mut SqliteConnection, symbol: &str) -> QueryResult<Vec<DailyBarRow>> {
    daily_bars::table
        .filter(daily_bars::symbol.eq(symbol))
        .order(daily_bars::date.asc())
        .select(DailyBarRow::as_select())
        .load(conn)
}

/// Daily bars with `from <= date <= to`, oldest first.
pub fn load_daily_between(
    conn: &mut SqliteConnection,
    symbol: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> QueryResult<Vec<DailyBarRow>> {
    daily_bars::table
        .filter(daily_bars::symbol.eq(symbol))
        .filter(daily_bars::date.ge(from))
        .filter(daily_bars::date.le(to))
        .order(daily_bars::date.asc())
        .select(DailyBarRow::as_select())
        .load(conn)
}

/// Earliest and latest daily dates for `symbol`.
pub fn daily_date_bounds(
    conn: &mut SqliteConnection,
    symbol: &str,
) -> QueryResult<Option<(NaiveDate, NaiveDate)>> {
    let base = daily_bars::table
        .filter(daily_bars::symbol.eq(symbol))
        .select(daily_bars::date);
    let first = base.clone().order(daily_bars::date.asc()).first(conn).optional()?;
    let last = base.order(daily_bars::date.desc()).first(conn).optional()?;
    Ok(first.zip(last))
}

/// `last_refreshed` of the newest daily bar (by date).
pub fn newest_daily_refresh(
    conn: &mut SqliteConnection,
    symbol: &str,
) -> QueryResult<Option<NaiveDateTime>> {
    daily_bars::table
        .filter(daily_bars::symbol.eq(symbol))
        .order(daily_bars::date.desc())
        .select(daily_bars::last_refreshed)
        .first(conn)
        .optional()
}

/// Latest `last_refreshed` across all daily bars of `symbol`.
pub fn max_daily_refresh(
    conn: &mut SqliteConnection,
    symbol: &str,
) -> QueryResult<Option<NaiveDateTime>> {
    daily_bars::table
        .filter(daily_bars::symbol.eq(symbol))
        .order(daily_bars::last_refreshed.desc())
        .select(daily_bars::last_refreshed)
        .first(conn)
        .optional()
}

/// Whether an intraday bar exists at exactly `ts`.
pub fn intraday_exists(
    conn: &mut SqliteConnection,
    symbol: &str,
    ts: NaiveDateTime,
) -> QueryResult<bool> {
    select(exists(
        intraday_bars::table
            .filter(intraday_bars::symbol.eq(symbol))
            .filter(intraday_bars::ts.eq(ts)),
    ))
    .get_result(conn)
}

/// Plain insert; a duplicate key is a unique violation.
pub fn insert_intraday(conn: &mut SqliteConnection, row: &IntradayBarRow) -> QueryResult<usize> {
    insert_into(intraday_bars::table).values(row).execute(conn)
}

/// Every intraday bar for `symbol`, oldest first.
pub fn load_intraday(
    conn: &mut SqliteConnection,
    symbol: &str,
) -> QueryResult<Vec<IntradayBarRow>> {
    intraday_bars::table
        .filter(intraday_bars::symbol.eq(symbol))
        .order(intraday_bars::ts.asc())
        .select(IntradayBarRow::as_select())
        .load(conn)
}
