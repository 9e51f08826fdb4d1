//! Rollup aggregator: weekly, monthly and yearly averages of daily bars.
//!
//! ## Scope
//! Only the latest year is recomputed when the rollup already reaches into
//! it (its newest anchor is at or after the anchor of January 1st of the
//! latest daily year). Otherwise every year from the first to the last daily
//! bar is rebuilt.
//!
//! ## Per year
//! The year's bars (for weeks: the year widened to whole ISO weeks) are
//! grouped into buckets, each field is averaged over the bars that carry a
//! value, and every bucket is upserted by `(symbol, anchor)`. One
//! `BEGIN IMMEDIATE` transaction per year; a failure rolls back that year
//! and stops the run. Years already committed stay.

pub mod bucket;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use diesel::{Connection, SqliteConnection, result::Error as DieselError};
use serde::Serialize;
use tracing::{debug, error, info, instrument};

use crate::clock::Clock;
use crate::error::RollupError;
use crate::kind::Resolution;
use crate::models::{AggregateRow, DailyBarRow};
use crate::store::{bars, rollups};
use crate::symbol::Symbol;

/// Outcome of [`refresh_rollup`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollupReport {
    /// Symbol aggregated.
    pub symbol: String,
    /// Resolution aggregated.
    pub resolution: Resolution,
    /// Years that had bars and were committed, in order.
    pub years: Vec<i32>,
    /// Buckets upserted across all years.
    pub buckets_written: usize,
    /// Whether every year was recomputed.
    pub full_rebuild: bool,
}

/// Recomputes the `resolution` rollup of `symbol` from its daily bars.
#[instrument(skip_all, fields(symbol = %symbol, resolution = %resolution))]
pub fn refresh_rollup(
    conn: &mut SqliteConnection,
    symbol: &Symbol,
    resolution: Resolution,
    clock: &dyn Clock,
) -> Result<RollupReport, RollupError> {
    let sym = symbol.as_str();
    let mut report = RollupReport {
        symbol: sym.to_string(),
        resolution,
        years: Vec::new(),
        buckets_written: 0,
        full_rebuild: false,
    };

    let bounds =
        bars::daily_date_bounds(conn, sym).map_err(|e| RollupError::from_db(sym, None, e))?;
    let Some((earliest, latest)) = bounds else {
        info!("no daily bars; nothing to aggregate");
        return Ok(report);
    };

    let latest_anchor = rollups::latest_anchor(conn, resolution, sym)
        .map_err(|e| RollupError::from_db(sym, None, e))?;
    let (years, full_rebuild) = scope(resolution, latest_anchor, earliest, latest);
    report.full_rebuild = full_rebuild;

    let now = clock.now().naive_utc();
    for year in years {
        let Some((from, to)) = resolution.year_window(year) else {
            continue;
        };

        let written = conn
            .immediate_transaction(|conn| {
                let rows = bars::load_daily_between(conn, sym, from, to)?;
                if rows.is_empty() {
                    return Ok(None);
                }
                let buckets = aggregate(resolution, sym, &rows, now);
                for bucket in &buckets {
                    rollups::upsert_aggregate(conn, resolution, bucket)?;
                }
                Ok::<_, DieselError>(Some(buckets.len()))
            })
            .map_err(|e| {
                error!(year, error = %e, "rollup year rolled back");
                RollupError::from_db(sym, Some(year), e)
            })?;

        if let Some(n) = written {
            debug!(year, buckets = n, "rollup year committed");
            report.years.push(year);
            report.buckets_written += n;
        }
    }

    info!(
        years = report.years.len(),
        buckets = report.buckets_written,
        full_rebuild = report.full_rebuild,
        "rollup complete"
    );
    Ok(report)
}

fn year_start(resolution: Resolution, year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .map(|d| resolution.anchor(d))
        .unwrap_or(NaiveDate::MIN)
}

/// Years to recompute, oldest first, and whether that is a full rebuild.
fn scope(
    resolution: Resolution,
    latest_anchor: Option<NaiveDate>,
    earliest: NaiveDate,
    latest: NaiveDate,
) -> (Vec<i32>, bool) {
    match latest_anchor {
        Some(anchor) if anchor >= year_start(resolution, latest.year()) => {
            (vec![latest.year()], false)
        }
        _ => ((earliest.year()..=latest.year()).collect(), true),
    }
}

/// Groups date-ordered bars into buckets and averages each field.
///
/// A field missing on some bars is averaged over the bars that have it; a
/// field missing on every bar of the bucket stays `None`.
pub fn aggregate(
    resolution: Resolution,
    symbol: &str,
    rows: &[DailyBarRow],
    now: NaiveDateTime,
) -> Vec<AggregateRow> {
    rows.chunk_by(|a, b| resolution.bucket_key(a.date) == resolution.bucket_key(b.date))
        .map(|bucket| AggregateRow {
            symbol: symbol.to_string(),
            anchor: resolution.anchor(bucket[0].date),
            open: mean(bucket.iter().map(|r| r.open)),
            high: mean(bucket.iter().map(|r| r.high)),
            low: mean(bucket.iter().map(|r| r.low)),
            close: mean(bucket.iter().map(|r| r.close)),
            volume: mean(bucket.iter().map(|r| r.volume)),
            last_refreshed: now,
        })
        .collect()
}

fn mean(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, n) = values
        .flatten()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}
