//! Rollup table access.
//!
//! The three rollup tables share a layout, so their queries are stamped out
//! by `rollup_table!` and dispatched on [`Resolution`].

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use diesel::{RunQueryDsl, SqliteConnection};

use crate::kind::Resolution;
use crate::models::AggregateRow;

macro_rules! rollup_table {
    ($module:ident, $table:ident) => {
        mod $module {
            use super::*;
            use crate::schema::$table::dsl as t;

            pub(super) fn upsert(conn: &mut SqliteConnection, row: &AggregateRow) -> QueryResult<usize> {
                let values = (
                    t::symbol.eq(&row.symbol),
                    t::anchor.eq(row.anchor),
                    t::open.eq(row.open),
                    t::high.eq(row.high),
                    t::low.eq(row.low),
                    t::close.eq(row.close),
                    t::volume.eq(row.volume),
                    t::last_refreshed.eq(row.last_refreshed),
                );
                diesel::insert_into(t::$table)
                    .values(values)
                    .on_conflict((t::symbol, t::anchor))
                    .do_update()
                    .set((
                        t::open.eq(row.open),
                        t::high.eq(row.high),
                        t::low.eq(row.low),
                        t::close.eq(row.close),
                        t::volume.eq(row.volume),
                        t::last_refreshed.eq(row.last_refreshed),
                    ))
                    .execute(conn)
            }

            pub(super) fn load(conn: &mut SqliteConnection, symbol: &str) -> QueryResult<Vec<AggregateRow>> {
                t::$table
                    .filter(t::symbol.eq(symbol))
                    .order(t::anchor.asc())
                    .select((
                        t::symbol,
                        t::anchor,
                        t::open,
                        t::high,
                        t::low,
                        t::close,
                        t::volume,
                        t::last_refreshed,
                    ))
                    .load(conn)
            }

            pub(super) fn latest_anchor(
                conn: &mut SqliteConnection,
                symbol: &str,
            ) -> QueryResult<Option<NaiveDate>> {
                t::$table
                    .filter(t::symbol.eq(symbol))
                    .order(t::anchor.desc())
                    .select(t::anchor)
                    .first(conn)
                    .optional()
            }

            pub(super) fn max_refresh(
                conn: &mut SqliteConnection,
                symbol: &str,
            ) -> QueryResult<Option<NaiveDateTime>> {
                t::$table
                    .filter(t::symbol.eq(symbol))
                    .order(t::last_refreshed.desc())
                    .select(t::last_refreshed)
                    .first(conn)
                    .optional()
            }
        }
    };
}

rollup_table!(weekly, weekly_averages);
rollup_table!(monthly, monthly_averages);
rollup_table!(yearly, yearly_averages);

/// Insert or overwrite the bucket at `(row.symbol, row.anchor)`.
pub fn upsert_aggregate(
    conn: &mut SqliteConnection,
    res: Resolution,
    row: &AggregateRow,
) -> QueryResult<usize> {
    match res {
        Resolution::Weekly => weekly::upsert(conn, row),
        Resolution::Monthly => monthly::upsert(conn, row),
        Resolution::Yearly => yearly::upsert(conn, row),
    }
}

/// Every bucket for `symbol`, oldest anchor first.
pub fn load_aggregates(
    conn: &mut SqliteConnection,
    res: Resolution,
    symbol: &str,
) -> QueryResult<Vec<AggregateRow>> {
    match res {
        Resolution::Weekly => weekly::load(conn, symbol),
        Resolution::Monthly => monthly::load(conn, symbol),
        Resolution::Yearly => yearly::load(conn, symbol),
    }
}

/// Newest anchor stored for `symbol`.
pub fn latest_anchor(
    conn: &mut SqliteConnection,
    res: Resolution,
    symbol: &str,
) -> QueryResult<Option<NaiveDate>> {
    match res {
        Resolution::Weekly => weekly::latest_anchor(conn, symbol),
        Resolution::Monthly => monthly::latest_anchor(conn, symbol),
        Resolution::Yearly => yearly::latest_anchor(conn, symbol),
    }
}

/// Latest `last_refreshed` among the symbol's buckets.
pub fn max_rollup_refresh(
    conn: &mut SqliteConnection,
    res: Resolution,
    symbol: &str,
) -> QueryResult<Option<NaiveDateTime>> {
    match res {
        Resolution::Weekly => weekly::max_refresh(conn, symbol),
        Resolution::Monthly => monthly::max_refresh(conn, symbol),
        Resolution::Yearly => yearly::max_refresh(conn, symbol),
    }
}
