use chrono::Duration;
use diesel::connection::SimpleConnection;
use market_data_ingestor::models::overview::RawOverview;
use series_sync::ingest::IngestSettings;
use series_sync::kind::{Resolution, SeriesKind};
use series_sync::rollup::refresh_rollup;
use series_sync::symbol::Symbol;

mod common;
use common::{StaticSource, date, daily_row, ingestor_at, oracle_at, seed_daily, utc};

#[test]
fn daily_is_fresh_from_local_midnight_on() {
    let (_db, mut conn) = common::setup_db();
    // New York is on EDT: midnight is 04:00 UTC.
    let (_clock, oracle) = oracle_at(utc(2024, 6, 12, 15, 0, 0));

    assert!(!oracle.is_fresh(&mut conn, "IBM", SeriesKind::Daily));

    let at_midnight = utc(2024, 6, 12, 4, 0, 0).naive_utc();
    seed_daily(&mut conn, &[daily_row("IBM", date(2024, 6, 11), Some(1.0), at_midnight)]);
    assert!(oracle.is_fresh(&mut conn, "IBM", SeriesKind::Daily));

    let just_before = utc(2024, 6, 12, 3, 59, 59).naive_utc();
    seed_daily(&mut conn, &[daily_row("MSFT", date(2024, 6, 11), Some(1.0), just_before)]);
    assert!(!oracle.is_fresh(&mut conn, "MSFT", SeriesKind::Daily));
}

#[test]
fn daily_freshness_follows_the_newest_bar() {
    let (_db, mut conn) = common::setup_db();
    let (_clock, oracle) = oracle_at(utc(2024, 6, 12, 15, 0, 0));
    seed_daily(
        &mut conn,
        &[
            daily_row("IBM", date(2024, 6, 10), Some(1.0), utc(2024, 6, 12, 10, 0, 0).naive_utc()),
            daily_row("IBM", date(2024, 6, 11), Some(1.0), utc(2024, 6, 11, 22, 0, 0).naive_utc()),
        ],
    );
    assert!(!oracle.is_fresh(&mut conn, "IBM", SeriesKind::Daily));
}

#[test]
fn intraday_is_never_fresh() {
    let (_db, mut conn) = common::setup_db();
    let (_clock, oracle) = oracle_at(utc(2024, 6, 12, 15, 0, 0));
    assert!(!oracle.is_fresh(&mut conn, "IBM", SeriesKind::Intraday));
}

#[tokio::test]
async fn overview_goes_stale_after_seven_days() {
    let (_db, mut conn) = common::setup_db();
    let source = StaticSource::default();
    source.set_overview(RawOverview::from_iter([("Symbol", "IBM"), ("Name", "IBM Corp")]));
    let (clock, mut ingestor) =
        ingestor_at(source, utc(2024, 6, 1, 12, 0, 0), IngestSettings::default());
    let ibm = Symbol::parse("IBM").unwrap();

    ingestor.sync(&mut conn, &ibm, SeriesKind::Overview).await.unwrap();

    clock.advance(Duration::days(7));
    assert!(ingestor.oracle().is_fresh(&mut conn, "IBM", SeriesKind::Overview));
    clock.advance(Duration::seconds(1));
    assert!(!ingestor.oracle().is_fresh(&mut conn, "IBM", SeriesKind::Overview));
}

#[test]
fn rollups_follow_daily_writes() {
    let (_db, mut conn) = common::setup_db();
    let (clock, oracle) = oracle_at(utc(2024, 6, 12, 15, 0, 0));

    // Nothing to compute from.
    assert!(oracle.is_fresh(&mut conn, "IBM", SeriesKind::Weekly));

    seed_daily(
        &mut conn,
        &[daily_row("IBM", date(2024, 6, 11), Some(1.0), utc(2024, 6, 12, 14, 0, 0).naive_utc())],
    );
    assert!(!oracle.is_fresh(&mut conn, "IBM", SeriesKind::Weekly));

    let ibm = Symbol::parse("IBM").unwrap();
    refresh_rollup(&mut conn, &ibm, Resolution::Weekly, clock.as_ref()).unwrap();
    assert!(oracle.is_fresh(&mut conn, "IBM", SeriesKind::Weekly));
    assert!(!oracle.is_fresh(&mut conn, "IBM", SeriesKind::Monthly));

    clock.advance(Duration::hours(1));
    seed_daily(
        &mut conn,
        &[daily_row("IBM", date(2024, 6, 12), Some(1.0), utc(2024, 6, 12, 16, 0, 0).naive_utc())],
    );
    assert!(!oracle.is_fresh(&mut conn, "IBM", SeriesKind::Weekly));
}

#[test]
fn storage_errors_read_as_stale() {
    let (_db, mut conn) = common::setup_db();
    let (_clock, oracle) = oracle_at(utc(2024, 6, 12, 15, 0, 0));
    seed_daily(
        &mut conn,
        &[daily_row("IBM", date(2024, 6, 11), Some(1.0), utc(2024, 6, 12, 14, 0, 0).naive_utc())],
    );
    conn.batch_execute("DROP TABLE daily_bars;").unwrap();

    assert!(oracle.check(&mut conn, "IBM", SeriesKind::Daily).is_err());
    assert!(!oracle.is_fresh(&mut conn, "IBM", SeriesKind::Daily));
}

#[tokio::test]
async fn huge_overview_window_does_not_overflow() {
    let (_db, mut conn) = common::setup_db();
    let source = StaticSource::default();
    source.set_overview(RawOverview::from_iter([("Symbol", "IBM")]));
    let clock = std::sync::Arc::new(series_sync::clock::FixedClock::new(utc(2024, 6, 1, 12, 0, 0)));
    let policy = series_sync::freshness::FreshnessPolicy {
        overview_max_age: Duration::days(4_000_000_000),
        ..Default::default()
    };
    let oracle = series_sync::freshness::FreshnessOracle::new(policy, clock);
    let mut ingestor =
        series_sync::ingest::Ingestor::new(source, oracle, IngestSettings::default());
    let ibm = Symbol::parse("IBM").unwrap();

    ingestor.sync(&mut conn, &ibm, SeriesKind::Overview).await.unwrap();
    assert!(ingestor.oracle().check(&mut conn, "IBM", SeriesKind::Overview).unwrap());
}

#[test]
fn rollup_missing_its_newest_bucket_is_stale() {
    let (_db, mut conn) = common::setup_db();
    let (clock, oracle) = oracle_at(utc(2024, 1, 6, 12, 0, 0));
    let written = utc(2024, 1, 5, 22, 0, 0).naive_utc();
    seed_daily(
        &mut conn,
        &[
            daily_row("IBM", date(2023, 12, 29), Some(1.0), written),
            daily_row("IBM", date(2024, 1, 5), Some(2.0), written),
        ],
    );
    let ibm = Symbol::parse("IBM").unwrap();
    refresh_rollup(&mut conn, &ibm, Resolution::Monthly, clock.as_ref()).unwrap();
    assert!(oracle.is_fresh(&mut conn, "IBM", SeriesKind::Monthly));

    // Buckets computed after the last daily write, but January is gone.
    conn.batch_execute("DELETE FROM monthly_averages WHERE anchor >= '2024-01-01';")
        .unwrap();
    assert!(!oracle.is_fresh(&mut conn, "IBM", SeriesKind::Monthly));
}
