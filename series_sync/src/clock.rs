//! Wall-clock access and local-midnight math.
//!
//! What this module provides:
//! - [`Clock`]: the engine's only source of "now". [`SystemClock`] in
//!   production, [`FixedClock`] wherever a test or replay needs a pinned instant.
//! - [`LocalZone`]: the zone that defines "today" for daily freshness, either
//!   an IANA zone (e.g. "America/New_York") or the host's local zone.
//! - [`local_midnight_utc`]: the UTC instant at which the current local day began.
//!
//! Notes:
//! - Some zones move their clocks at midnight. When midnight is skipped
//!   (e.g. America/Santiago) the day starts at the first valid instant after
//!   the gap; when it occurs twice (e.g. America/Havana) the earlier one wins.
//! - All database timestamps are UTC. Local time only matters for the day boundary.

use std::{str::FromStr, sync::Mutex};

use chrono::{DateTime, Local, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::InvalidArgument;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// Now, in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to an instant that only moves when told to.
#[derive(Debug)]
pub struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
    /// Pins the clock at `at`.
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(Mutex::new(at))
    }

    /// Moves the clock to `at`.
    pub fn set(&self, at: DateTime<Utc>) {
        let mut guard = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = at;
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: chrono::Duration) {
        let mut guard = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// The zone whose calendar day bounds daily freshness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalZone {
    /// Whatever the host is configured with.
    #[default]
    Host,
    /// A fixed IANA zone.
    Named(Tz),
}

impl FromStr for LocalZone {
    type Err = InvalidArgument;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.is_empty() || name.eq_ignore_ascii_case("local") {
            return Ok(LocalZone::Host);
        }
        name.parse::<Tz>()
            .map(LocalZone::Named)
            .map_err(|_| InvalidArgument::new(format!("unknown time zone '{name}'")))
    }
}

/// The UTC instant of the most recent local midnight at or before `now`.
pub fn local_midnight_utc(now: DateTime<Utc>, zone: LocalZone) -> DateTime<Utc> {
    match zone {
        LocalZone::Host => midnight_in(now, &Local),
        LocalZone::Named(tz) => midnight_in(now, &tz),
    }
}

fn midnight_in<Z: TimeZone>(now: DateTime<Utc>, tz: &Z) -> DateTime<Utc> {
    let day = now.with_timezone(tz).date_naive();
    start_of_local_day(day.and_time(NaiveTime::MIN), tz)
}

/// Earliest instant of an ambiguous wall time; for a skipped one, the first
/// valid minute after the gap (searched up to 2 hours, then UTC midnight).
fn start_of_local_day<Z: TimeZone>(midnight: NaiveDateTime, tz: &Z) -> DateTime<Utc> {
    let mut t = midnight;
    for _ in 0..=120 {
        if let Some(dt) = tz.from_local_datetime(&t).earliest() {
            return dt.with_timezone(&Utc);
        }
        t += chrono::Duration::minutes(1);
    }
    midnight.and_utc()
}
