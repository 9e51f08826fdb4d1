//! Calendar bucket math for rollups.
//!
//! - Week: ISO week, Monday-anchored. Key is the ISO (year, week) pair, so a
//!   week straddling New Year has one key no matter which side it is seen from.
//! - Month: (year, month), anchored on the 1st.
//! - Year: the calendar year, anchored on January 1st.
//!
//! All inputs are calendar dates; no time zone is involved.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::kind::Resolution;

/// Grouping key of a bucket. Ordering follows calendar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BucketKey {
    /// ISO year for weeks, calendar year otherwise.
    pub year: i32,
    /// ISO week (1..=53), month (1..=12), or 0 for yearly buckets.
    pub part: u32,
}

/// First day of the bucket holding `date`.
pub fn anchor(res: Resolution, date: NaiveDate) -> NaiveDate {
    match res {
        Resolution::Weekly => week_monday(date),
        Resolution::Monthly => date.with_day(1).unwrap_or(date),
        Resolution::Yearly => date.with_ordinal(1).unwrap_or(date),
    }
}

/// Grouping key of the bucket holding `date`.
pub fn bucket_key(res: Resolution, date: NaiveDate) -> BucketKey {
    match res {
        Resolution::Weekly => {
            let iso = date.iso_week();
            BucketKey {
                year: iso.year(),
                part: iso.week(),
            }
        }
        Resolution::Monthly => BucketKey {
            year: date.year(),
            part: date.month(),
        },
        Resolution::Yearly => BucketKey {
            year: date.year(),
            part: 0,
        },
    }
}

/// Inclusive range of daily bars read when recomputing `year`.
///
/// Months and years use the calendar year. Weeks widen it to whole ISO
/// weeks: from the Monday of the week holding January 1st to the Sunday of
/// the week holding December 31st. `None` only for years chrono cannot
/// represent.
pub fn year_window(res: Resolution, year: i32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let last = NaiveDate::from_ymd_opt(year, 12, 31)?;
    Some(match res {
        Resolution::Monthly | Resolution::Yearly => (first, last),
        Resolution::Weekly => (week_monday(first), week_monday(last) + Duration::days(6)),
    })
}

fn week_monday(date: NaiveDate) -> NaiveDate {
    date.week(Weekday::Mon).first_day()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn anchors() {
        // 2024-01-01 is a Monday.
        assert_eq!(anchor(Resolution::Weekly, d(2024, 1, 5)), d(2024, 1, 1));
        assert_eq!(anchor(Resolution::Weekly, d(2024, 1, 7)), d(2024, 1, 1));
        assert_eq!(anchor(Resolution::Weekly, d(2024, 1, 8)), d(2024, 1, 8));
        assert_eq!(anchor(Resolution::Monthly, d(2024, 2, 29)), d(2024, 2, 1));
        assert_eq!(anchor(Resolution::Yearly, d(2024, 12, 31)), d(2024, 1, 1));
    }

    #[test]
    fn new_year_week_shares_one_key() {
        // 2024-12-30 (Mon) .. 2025-01-05 (Sun) is ISO week 2025-W01.
        let a = bucket_key(Resolution::Weekly, d(2024, 12, 31));
        let b = bucket_key(Resolution::Weekly, d(2025, 1, 2));
        assert_eq!(a, b);
        assert_eq!(a, BucketKey { year: 2025, part: 1 });
        assert_eq!(anchor(Resolution::Weekly, d(2025, 1, 2)), d(2024, 12, 30));
    }

    #[test]
    fn weekly_window_covers_whole_weeks() {
        // 2025-01-01 is a Wednesday; 2025-12-31 is a Wednesday.
        let (from, to) = year_window(Resolution::Weekly, 2025).unwrap();
        assert_eq!(from, d(2024, 12, 30));
        assert_eq!(to, d(2026, 1, 4));

        let (from, to) = year_window(Resolution::Monthly, 2025).unwrap();
        assert_eq!((from, to), (d(2025, 1, 1), d(2025, 12, 31)));
    }

    proptest! {
        #[test]
        fn anchor_is_in_bucket_and_not_after_date(days in 0i64..40_000) {
            let date = d(1970, 1, 1) + Duration::days(days);
            for res in Resolution::ALL {
                let a = anchor(res, date);
                prop_assert!(a <= date);
                prop_assert_eq!(bucket_key(res, a), bucket_key(res, date));
            }
        }

        #[test]
        fn weekly_anchor_is_monday(days in 0i64..40_000) {
            let date = d(1970, 1, 1) + Duration::days(days);
            prop_assert_eq!(anchor(Resolution::Weekly, date).weekday(), Weekday::Mon);
        }
    }
}
