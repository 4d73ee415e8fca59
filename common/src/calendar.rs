//! Calendar arithmetic over [`Date`]s.

use time::{util, Date, Duration, Month};

/// Returns the number of days in the provided `month` of the provided `year`.
#[must_use]
pub fn days_in_month(year: i32, month: Month) -> u8 {
    util::days_in_year_month(year, month)
}

/// Returns the number of days in the month the provided [`Date`] belongs to.
#[must_use]
pub fn days_in_month_of(date: Date) -> u8 {
    days_in_month(date.year(), date.month())
}

/// Returns the [`Date`] having the provided `day` in the same month as the
/// provided `date`, clamping the `day` to that month's last day.
#[must_use]
pub fn with_day_clamped(date: Date, day: u8) -> Date {
    let day = day.clamp(1, days_in_month_of(date));
    Date::from_calendar_date(date.year(), date.month(), day).unwrap_or(date)
}

/// Adds the provided number of calendar `months` to the provided [`Date`],
/// clamping its day to the last day of the resulting month.
///
/// Saturates to [`Date::MAX`] if the result is out of the supported range.
#[must_use]
pub fn add_months(date: Date, months: u32) -> Date {
    let index = i64::from(date.year()) * 12
        + i64::from(u8::from(date.month()) - 1)
        + i64::from(months);
    let Ok(year) = i32::try_from(index.div_euclid(12)) else {
        return Date::MAX;
    };
    let Some(month) = u8::try_from(index.rem_euclid(12) + 1)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
    else {
        return Date::MAX;
    };
    let day = date.day().min(days_in_month(year, month));
    Date::from_calendar_date(year, month, day).unwrap_or(Date::MAX)
}

/// Adds the provided number of `days` to the provided [`Date`].
///
/// Saturates to [`Date::MAX`] if the result is out of the supported range.
#[must_use]
pub fn add_days(date: Date, days: u32) -> Date {
    date.checked_add(Duration::days(i64::from(days)))
        .unwrap_or(Date::MAX)
}

/// Returns the first day of the month following the one the provided [`Date`]
/// belongs to.
#[must_use]
pub fn first_of_next_month(date: Date) -> Date {
    add_months(with_day_clamped(date, 1), 1)
}

/// Returns the number of days in the `[from, to)` range, or zero if the range
/// is empty.
#[must_use]
pub fn days_between(from: Date, to: Date) -> u32 {
    u32::try_from((to - from).whole_days()).unwrap_or(0)
}
