//! Freshness oracle: decides whether stored data is recent enough to skip a
//! re-fetch (or a rollup recompute).
//!
//! Rules per [`SeriesKind`] (see [`FreshnessRule`]):
//! - overview: `last_refreshed >= now - max_age` (7 days by default)
//! - daily: newest bar (by date) written at or after local midnight
//! - intraday: never fresh
//! - weekly/monthly/yearly: newest bucket computed at or after the newest
//!   daily write, and a bucket exists for the newest daily bar; with no daily
//!   rows there is nothing to recompute
//!
//! Reads only. A storage error is logged and reported as stale, which at
//! worst costs one extra fetch.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use diesel::{QueryResult, SqliteConnection};
use tracing::warn;

use crate::clock::{Clock, LocalZone, SystemClock, local_midnight_utc};
use crate::kind::{FreshnessRule, SeriesKind};
use crate::store::{bars, overview, rollups};

/// Tunables for the freshness rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    /// How long an overview row stays fresh.
    pub overview_max_age: Duration,
    /// Zone that defines the calendar day for daily bars.
    pub zone: LocalZone,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            overview_max_age: Duration::days(7),
            zone: LocalZone::Host,
        }
    }
}

/// Applies a [`FreshnessPolicy`] against the store at the clock's "now".
#[derive(Clone)]
pub struct FreshnessOracle {
    policy: FreshnessPolicy,
    clock: Arc<dyn Clock>,
}

impl Default for FreshnessOracle {
    fn default() -> Self {
        Self::new(FreshnessPolicy::default(), Arc::new(SystemClock))
    }
}

impl std::fmt::Debug for FreshnessOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FreshnessOracle")
            .field("policy", &self.policy)
            .field("now", &self.clock.now())
            .finish()
    }
}

impl FreshnessOracle {
    /// Oracle with an explicit policy and clock.
    pub fn new(policy: FreshnessPolicy, clock: Arc<dyn Clock>) -> Self {
        Self { policy, clock }
    }

    /// The clock every timestamp written by the engine comes from.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Current instant according to the clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// The active policy.
    pub fn policy(&self) -> &FreshnessPolicy {
        &self.policy
    }

    /// `true` when `kind` for `symbol` does not need a refresh. Fails open:
    /// a storage error yields `false`.
    pub fn is_fresh(&self, conn: &mut SqliteConnection, symbol: &str, kind: SeriesKind) -> bool {
        match self.check(conn, symbol, kind) {
            Ok(fresh) => fresh,
            Err(e) => {
                warn!(%symbol, %kind, error = %e, "freshness check failed; treating as stale");
                false
            }
        }
    }

    /// Same as [`FreshnessOracle::is_fresh`] but surfaces storage errors.
    pub fn check(
        &self,
        conn: &mut SqliteConnection,
        symbol: &str,
        kind: SeriesKind,
    ) -> QueryResult<bool> {
        let now = self.clock.now();
        match kind.freshness_rule() {
            FreshnessRule::AlwaysStale => Ok(false),
            FreshnessRule::MaxAge => {
                let cutoff = now
                    .checked_sub_signed(self.policy.overview_max_age)
                    .unwrap_or(DateTime::<Utc>::MIN_UTC);
                Ok(overview::find_overview(conn, symbol)?
                    .is_some_and(|row| row.last_refreshed.and_utc() >= cutoff))
            }
            FreshnessRule::SinceLocalMidnight => {
                let midnight = local_midnight_utc(now, self.policy.zone);
                Ok(bars::newest_daily_refresh(conn, symbol)?
                    .is_some_and(|ts| ts.and_utc() >= midnight))
            }
            FreshnessRule::AfterDailyRefresh => {
                let Some(res) = kind.resolution() else {
                    return Ok(false);
                };
                let Some(daily) = bars::max_daily_refresh(conn, symbol)? else {
                    return Ok(true);
                };
                let computed_after = rollups::max_rollup_refresh(conn, res, symbol)?
                    .is_some_and(|computed| computed >= daily);
                if !computed_after {
                    return Ok(false);
                }
                // A refresh that failed partway leaves recent timestamps but
                // no bucket for the newest bar.
                let Some((_, latest_bar)) = bars::daily_date_bounds(conn, symbol)? else {
                    return Ok(true);
                };
                Ok(rollups::latest_anchor(conn, res, symbol)?
                    .is_some_and(|anchor| anchor >= res.anchor(latest_bar)))
            }
        }
    }
}
