//! Release day alignment and proration.

use common::{calendar, Money};
use time::Date;

/// Returns the first release date on or after the provided `start`.
///
/// A `start` past the release day of its month is aligned to the release day
/// of the following month. The `release_day` is clamped to `1..=31` and to
/// the length of the resulting month.
#[must_use]
pub fn next_release_date(start: Date, release_day: u8) -> Date {
    let release_day = release_day.clamp(1, 31);

    let candidate = calendar::with_day_clamped(start, release_day);
    if candidate == start {
        return candidate;
    }
    calendar::with_day_clamped(calendar::add_months(start, 1), release_day)
}

/// Indicates whether a monthly term starting at the provided `start` is not
/// aligned to the provided `release_day`.
#[must_use]
pub fn is_misaligned(start: Date, release_day: u8) -> bool {
    next_release_date(start, release_day) != start
}

/// Computes the rent for the days from `start` until the next release date.
///
/// Zero is returned if `start` is already a release date.
#[must_use]
pub fn prorata_until_next_release(
    monthly_rent: Money,
    start: Date,
    release_day: u8,
) -> Money {
    let target = next_release_date(start, release_day);
    if target <= start {
        return Money::ZERO;
    }
    prorate(monthly_rent, start, target)
}

/// Computes the rent for the days in the `[from, until)` range.
///
/// Every month the range touches is charged by its own daily rate, so the
/// rate changes on month boundaries.
#[must_use]
pub fn prorate(monthly_rent: Money, from: Date, until: Date) -> Money {
    let mut total = Money::ZERO;
    let mut cursor = from;
    while cursor < until {
        let segment_end = calendar::first_of_next_month(cursor).min(until);
        total += daily_rate(monthly_rent, cursor)
            .times(calendar::days_between(cursor, segment_end));
        cursor = segment_end;
    }
    total
}

/// Returns the rent of a single day of the month the provided [`Date`]
/// belongs to, rounded half away from zero.
#[must_use]
pub fn daily_rate(monthly_rent: Money, date: Date) -> Money {
    monthly_rent.div_rounded(u32::from(calendar::days_in_month_of(date)))
}
