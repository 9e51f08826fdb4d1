//! Overview upsert and lookup.
use diesel::prelude::*;
use diesel::{RunQueryDsl, SqliteConnection, insert_into};

use crate::models::OverviewRow;
use crate::schema::overview;

/// Insert or overwrite every column of the symbol's overview row.
pub fn upsert_overview(conn: &mut SqliteConnection, row: &OverviewRow) -> QueryResult<usize> {
    insert_into(overview::table)
        .values(row)
        .on_conflict(overview::symbol)
        .do_update()
        .set(row)
        .execute(conn)
}

/// The overview row for `symbol`, if any.
pub fn find_overview(
    conn: &mut SqliteConnection,
    symbol: &str,
) -> QueryResult<Option<OverviewRow>> {
    overview::table
        .find(symbol)
        .select(OverviewRow::as_select())
        .first(conn)
        .optional()
}
