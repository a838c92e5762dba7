//! Calendar helpers shared by the rate archive and the accrual engine.

use chrono::{Datelike, Duration, NaiveDate};

/// Day 0 of the rate archive's key space (the Unix epoch).
pub const EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(1970, 1, 1) {
    Some(date) => date,
    None => panic!("invalid epoch"),
};

/// Date format used in deposit files and statement output.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Number of days elapsed since 1970-01-01 (negative for earlier dates).
pub fn day_index(date: NaiveDate) -> i64 {
    (date - EPOCH).num_days()
}

/// Inverse of [`day_index`].
pub fn date_from_day_index(day: i64) -> NaiveDate {
    EPOCH + Duration::days(day)
}

/// Proleptic Gregorian leap year rule.
pub fn is_leap_year(year: i32) -> bool {
    if year % 400 == 0 {
        true
    } else if year % 100 == 0 {
        false
    } else {
        year % 4 == 0
    }
}

pub fn days_in_year(year: i32) -> u32 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

/// The date one calendar month after `date`, on day `anchor_day` of that month.
///
/// When the month is too short for `anchor_day` the day is stepped back until
/// the date exists, so a deposit opened on the 31st rolls to the last day of
/// short months and returns to the 31st afterwards.
pub fn next_month_anchored(date: NaiveDate, anchor_day: u32) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };

    let mut day = anchor_day;
    loop {
        if let Some(next) = NaiveDate::from_ymd_opt(year, month, day) {
            return next;
        }
        // Every month has a 28th.
        day -= 1;
    }
}

/// Parse a date written either as `DD.MM.YYYY` or as ISO `YYYY-MM-DD`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .ok()
}

/// Every calendar day from `from` through `to`, inclusive.
pub fn date_range(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    from.iter_days().take_while(|d| *d <= to).collect()
}
