use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::Text;
use series_sync::db::connection::connect_sqlite;
use series_sync::db::migrate;

mod common;

#[derive(QueryableByName)]
struct TableName {
    #[diesel(sql_type = Text)]
    name: String,
}

#[test]
fn migrations_create_every_series_table() {
    let (_db, mut conn) = common::setup_db();

    let mut names: Vec<String> = sql_query(
        "SELECT name FROM sqlite_master WHERE type = 'table' \
         AND name NOT LIKE 'sqlite_%' AND name NOT LIKE '__diesel%' ORDER BY name",
    )
    .load::<TableName>(&mut conn)
    .unwrap()
    .into_iter()
    .map(|t| t.name)
    .collect();
    names.sort();

    assert_eq!(
        names,
        vec![
            "daily_bars",
            "intraday_bars",
            "monthly_averages",
            "overview",
            "weekly_averages",
            "yearly_averages",
        ]
    );
}

#[test]
fn sqlite_connection_applies_pragmas() {
    let (db, mut conn) = common::setup_db();
    common::assert_sqlite_pragmas(&mut conn);

    let mut second = connect_sqlite(&format!("sqlite://{}", db.path)).expect("connect second");
    common::assert_sqlite_pragmas(&mut second);
}

#[test]
fn rerunning_migrations_keeps_data() {
    let (db, mut conn) = common::setup_db();
    let refreshed = common::utc(2024, 1, 2, 21, 0, 0).naive_utc();
    common::seed_daily(
        &mut conn,
        &[common::daily_row("IBM", common::date(2024, 1, 2), Some(1.0), refreshed)],
    );

    migrate::run_all(&db.path).expect("rerun");
    assert_eq!(common::daily_count(&mut conn, "IBM"), 1);
}

#[test]
fn bar_keys_are_unique_per_symbol() {
    let (_db, mut conn) = common::setup_db();
    let refreshed = common::utc(2024, 1, 2, 21, 0, 0).naive_utc();
    let row = common::daily_row("IBM", common::date(2024, 1, 2), Some(1.0), refreshed);
    common::seed_daily(&mut conn, std::slice::from_ref(&row));

    let dup = series_sync::store::bars::insert_daily(&mut conn, &row).unwrap_err();
    assert!(matches!(
        dup,
        diesel::result::Error::DatabaseError(diesel::result::DatabaseErrorKind::UniqueViolation, _)
    ));

    let other = common::daily_row("MSFT", common::date(2024, 1, 2), Some(1.0), refreshed);
    series_sync::store::bars::insert_daily(&mut conn, &other).unwrap();
}
