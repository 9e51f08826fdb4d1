//! The consecutive-match merge walk shared by daily and intraday bars.
//!
//! Records are visited newest first. Absent keys are staged for insertion;
//! present keys feed a counter that grows while present keys are exactly one
//! bar apart and resets to 1 otherwise. When the counter reaches the
//! threshold the rest of the history is assumed to be stored already.
//!
//! Staged rows are flushed every `batch_size` rows, each batch in its own
//! `BEGIN IMMEDIATE` transaction. A failed flush rolls back that batch only.

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use diesel::{QueryResult, SqliteConnection, result::Error as DieselError};
use tracing::debug;

use crate::models::{DailyBarRow, IntradayBarRow};
use crate::store::bars;

/// A bar key with a notion of distance.
pub(crate) trait BarKey: Copy + Ord + fmt::Display {
    /// `self - earlier`.
    fn since(self, earlier: Self) -> Duration;
}

impl BarKey for NaiveDate {
    fn since(self, earlier: Self) -> Duration {
        self - earlier
    }
}

impl BarKey for NaiveDateTime {
    fn since(self, earlier: Self) -> Duration {
        self - earlier
    }
}

/// A bar table the walk can probe and append to.
pub(crate) trait BarTable {
    type Key: BarKey;
    type Row;

    fn key(row: &Self::Row) -> Self::Key;
    fn exists(conn: &mut SqliteConnection, symbol: &str, key: Self::Key) -> QueryResult<bool>;
    fn insert(conn: &mut SqliteConnection, row: &Self::Row) -> QueryResult<usize>;
}

pub(crate) struct DailyTable;

impl BarTable for DailyTable {
    type Key = NaiveDate;
    type Row = DailyBarRow;

    fn key(row: &DailyBarRow) -> NaiveDate {
        row.date
    }

    fn exists(conn: &mut SqliteConnection, symbol: &str, key: NaiveDate) -> QueryResult<bool> {
        bars::daily_exists(conn, symbol, key)
    }

    fn insert(conn: &mut SqliteConnection, row: &DailyBarRow) -> QueryResult<usize> {
        bars::insert_daily(conn, row)
    }
}

pub(crate) struct IntradayTable;

impl BarTable for IntradayTable {
    type Key = NaiveDateTime;
    type Row = IntradayBarRow;

    fn key(row: &IntradayBarRow) -> NaiveDateTime {
        row.ts
    }

    fn exists(conn: &mut SqliteConnection, symbol: &str, key: NaiveDateTime) -> QueryResult<bool> {
        bars::intraday_exists(conn, symbol, key)
    }

    fn insert(conn: &mut SqliteConnection, row: &IntradayBarRow) -> QueryResult<usize> {
        bars::insert_intraday(conn, row)
    }
}

/// Walk parameters.
#[derive(Debug, Clone, Copy)]
pub(crate) struct WalkSettings {
    pub step: Duration,
    pub threshold: u32,
    pub batch_size: usize,
}

/// What a walk did, up to where it stopped.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct WalkStats {
    /// Records examined, including the one that stopped the walk.
    pub visited: usize,
    /// Rows committed.
    pub inserted: usize,
    /// Records whose key was already stored.
    pub existing_seen: usize,
    /// Whether the consecutive-match threshold ended the walk.
    pub stopped_early: bool,
    /// Transactions committed.
    pub batches_committed: usize,
}

pub(crate) struct WalkFailure {
    pub stats: WalkStats,
    pub source: DieselError,
}

/// Sorts newest first and drops repeated keys, keeping the first occurrence
/// in delivery order.
pub(crate) fn order_for_walk<T: BarTable>(rows: &mut Vec<T::Row>) {
    // Stable sort: equal keys keep their arrival order.
    rows.sort_by(|a, b| T::key(b).cmp(&T::key(a)));
    rows.dedup_by(|later, earlier| T::key(later) == T::key(earlier));
}

pub(crate) fn merge<T: BarTable>(
    conn: &mut SqliteConnection,
    symbol: &str,
    mut rows: Vec<T::Row>,
    settings: WalkSettings,
) -> Result<WalkStats, WalkFailure> {
    order_for_walk::<T>(&mut rows);

    let batch_size = settings.batch_size.max(1);
    let mut stats = WalkStats::default();
    let mut staged: Vec<T::Row> = Vec::with_capacity(batch_size.min(rows.len()));
    let mut consecutive: u32 = 0;
    let mut previous: Option<T::Key> = None;

    for row in rows {
        let key = T::key(&row);
        stats.visited += 1;

        let present = match T::exists(conn, symbol, key) {
            Ok(present) => present,
            Err(source) => return Err(WalkFailure { stats, source }),
        };

        if present {
            stats.existing_seen += 1;
            consecutive = match previous {
                Some(prev) if prev.since(key) == settings.step => consecutive + 1,
                _ => 1,
            };
            previous = Some(key);

            if consecutive >= settings.threshold {
                debug!(%symbol, %key, consecutive, "consecutive-match threshold reached");
                stats.stopped_early = true;
                break;
            }
        } else {
            staged.push(row);
            previous = Some(key);

            if staged.len() >= batch_size {
                if let Err(source) = flush::<T>(conn, symbol, &mut staged, &mut stats) {
                    return Err(WalkFailure { stats, source });
                }
            }
        }
    }

    if !staged.is_empty() {
        if let Err(source) = flush::<T>(conn, symbol, &mut staged, &mut stats) {
            return Err(WalkFailure { stats, source });
        }
    }

    Ok(stats)
}

fn flush<T: BarTable>(
    conn: &mut SqliteConnection,
    symbol: &str,
    staged: &mut Vec<T::Row>,
    stats: &mut WalkStats,
) -> QueryResult<()> {
    let rows: &[T::Row] = staged;
    let written = conn.immediate_transaction(|conn| {
        let mut n = 0;
        for row in rows {
            n += T::insert(conn, row)?;
        }
        Ok::<_, DieselError>(n)
    })?;

    stats.inserted += written;
    stats.batches_committed += 1;
    debug!(%symbol, rows = written, batch = stats.batches_committed, "batch committed");
    staged.clear();
    Ok(())
}
