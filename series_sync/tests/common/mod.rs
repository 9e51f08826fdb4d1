#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::{Integer, Text};
use market_data_ingestor::models::{bar::RawBar, interval::IntradayInterval, overview::RawOverview};
use market_data_ingestor::providers::{ProviderError, TimeSeriesSource};
use series_sync::clock::{FixedClock, LocalZone};
use series_sync::db::{connection, migrate};
use series_sync::freshness::{FreshnessOracle, FreshnessPolicy};
use series_sync::ingest::{IngestSettings, Ingestor};
use series_sync::models::DailyBarRow;
use series_sync::store::bars;
use tempfile::TempDir;

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}
#[derive(QueryableByName)]
struct ForeignKeys {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}
#[derive(QueryableByName)]
struct BusyTimeout {
    #[diesel(sql_type = Integer, column_name = "timeout")]
    busy_timeout: i32,
}

pub struct TestDb {
    _dir: TempDir,    // keep alive for the life of the test
    pub path: String, // <tmpdir>/test.db
}

pub fn setup_db() -> (TestDb, SqliteConnection) {
    let dir = TempDir::new().expect("tempdir");
    let mut p = PathBuf::from(dir.path());
    p.push("test.db");
    let path = p.to_string_lossy().to_string();

    migrate::run_all(&path).expect("migrations");

    let conn = connection::connect_sqlite(&path).expect("connect");
    (TestDb { _dir: dir, path }, conn)
}

pub fn assert_sqlite_pragmas(conn: &mut SqliteConnection) {
    use diesel::sql_query;

    let jm: JournalMode = sql_query("PRAGMA journal_mode;").get_result(conn).unwrap();
    assert_eq!(jm.journal_mode.to_lowercase(), "wal"); // WAL is persistent per DB file

    let fk: ForeignKeys = sql_query("PRAGMA foreign_keys;").get_result(conn).unwrap();
    assert_eq!(fk.foreign_keys, 1);

    let bt: BusyTimeout = sql_query("PRAGMA busy_timeout;").get_result(conn).unwrap();
    assert_eq!(bt.busy_timeout, 5000);
}

/// Scripted source: hands back whatever the test loaded and counts calls.
#[derive(Default)]
pub struct StaticSource {
    pub overview: Mutex<RawOverview>,
    pub daily: Mutex<Vec<RawBar>>,
    pub intraday: Mutex<Vec<RawBar>>,
    pub fail_with: Mutex<Option<String>>,
    pub overview_calls: AtomicUsize,
    pub daily_calls: AtomicUsize,
    pub intraday_calls: AtomicUsize,
}

impl StaticSource {
    pub fn with_daily(bars: Vec<RawBar>) -> Self {
        let s = Self::default();
        s.set_daily(bars);
        s
    }

    pub fn set_daily(&self, bars: Vec<RawBar>) {
        *self.daily.lock().unwrap() = bars;
    }

    pub fn set_intraday(&self, bars: Vec<RawBar>) {
        *self.intraday.lock().unwrap() = bars;
    }

    pub fn set_overview(&self, overview: RawOverview) {
        *self.overview.lock().unwrap() = overview;
    }

    pub fn fail(&self, message: &str) {
        *self.fail_with.lock().unwrap() = Some(message.to_string());
    }

    pub fn total_calls(&self) -> usize {
        self.overview_calls.load(Ordering::SeqCst)
            + self.daily_calls.load(Ordering::SeqCst)
            + self.intraday_calls.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<(), ProviderError> {
        match self.fail_with.lock().unwrap().as_ref() {
            Some(msg) => Err(ProviderError::api(msg.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TimeSeriesSource for StaticSource {
    async fn fetch_overview(&self, _symbol: &str) -> Result<RawOverview, ProviderError> {
        self.overview_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(self.overview.lock().unwrap().clone())
    }

    async fn fetch_daily(&self, _symbol: &str) -> Result<Vec<RawBar>, ProviderError> {
        self.daily_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(self.daily.lock().unwrap().clone())
    }

    async fn fetch_intraday(
        &self,
        _symbol: &str,
        _interval: IntradayInterval,
    ) -> Result<Vec<RawBar>, ProviderError> {
        self.intraday_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(self.intraday.lock().unwrap().clone())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn utc(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, mi, s).unwrap()
}

/// `n` consecutive calendar days ending at `last`, newest first, with a
/// close equal to the day of month.
pub fn daily_bars(last: NaiveDate, n: usize) -> Vec<RawBar> {
    (0..n as i64)
        .map(|i| {
            let d = last - Duration::days(i);
            let c = f64::from(chrono::Datelike::day(&d));
            RawBar::from_numbers(d.format("%Y-%m-%d").to_string(), c, c + 1.0, c - 1.0, c, 1000.0)
        })
        .collect()
}

/// `n` bars `step_minutes` apart ending at `last`, newest first.
pub fn intraday_bars(last: DateTime<Utc>, n: usize, step_minutes: i64) -> Vec<RawBar> {
    (0..n as i64)
        .map(|i| {
            let ts = last - Duration::minutes(i * step_minutes);
            RawBar::from_numbers(ts.to_rfc3339(), 10.0, 11.0, 9.0, 10.5, 50.0)
        })
        .collect()
}

pub fn daily_row(symbol: &str, d: NaiveDate, close: Option<f64>, refreshed: NaiveDateTime) -> DailyBarRow {
    DailyBarRow {
        symbol: symbol.to_string(),
        date: d,
        open: close,
        high: close,
        low: close,
        close,
        volume: close.map(|c| c * 100.0),
        last_refreshed: refreshed,
    }
}

pub fn seed_daily(conn: &mut SqliteConnection, rows: &[DailyBarRow]) {
    for row in rows {
        bars::insert_daily(conn, row).expect("seed daily");
    }
}

pub fn daily_count(conn: &mut SqliteConnection, symbol: &str) -> usize {
    bars::load_daily(conn, symbol).expect("load daily").len()
}

/// Oracle on a pinned clock with days bounded by New York midnight.
pub fn oracle_at(at: DateTime<Utc>) -> (Arc<FixedClock>, FreshnessOracle) {
    let clock = Arc::new(FixedClock::new(at));
    let policy = FreshnessPolicy {
        zone: LocalZone::Named(chrono_tz::America::New_York),
        ..FreshnessPolicy::default()
    };
    (clock.clone(), FreshnessOracle::new(policy, clock))
}

pub fn ingestor_at(
    source: StaticSource,
    at: DateTime<Utc>,
    settings: IngestSettings,
) -> (Arc<FixedClock>, Ingestor<StaticSource>) {
    let (clock, oracle) = oracle_at(at);
    (clock, Ingestor::new(source, oracle, settings))
}
