//! Weekday-only business calendar
//!
//! Saturdays and Sundays are the only non-business days. Exchange holidays
//! are not modelled, so a weekday on which the market was closed still counts
//! as a business day here and simply has no price observation.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Check if a date falls on Monday through Friday
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// First weekday strictly after `date`
pub fn next_weekday(date: NaiveDate) -> NaiveDate {
    roll_to_weekday(date + Duration::days(1))
}

/// `date` itself if it is a weekday, otherwise the following Monday
pub fn roll_to_weekday(mut date: NaiveDate) -> NaiveDate {
    while !is_business_day(date) {
        date = date + Duration::days(1);
    }
    date
}

/// Number of business days in the half-open range `[begin, end)`.
///
/// Negative when `end` precedes `begin`, mirroring the usual `busday_count`
/// convention. With a weekend `begin` (2023-12-31 is a Sunday) and
/// `end = 2024-01-02` the count is 1.
pub fn business_days_between(begin: NaiveDate, end: NaiveDate) -> i64 {
    if end < begin {
        return -business_days_between(end, begin);
    }

    let total = (end - begin).num_days();
    let full_weeks = total / 7;
    let mut count = full_weeks * 5;

    let mut date = begin + Duration::days(full_weeks * 7);
    while date < end {
        if is_business_day(date) {
            count += 1;
        }
        date = date + Duration::days(1);
    }
    count
}
