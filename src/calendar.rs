//! In-game calendar dates
//!
//! Game servers report `start_date` and `game_date` as a plain day count
//! since year 0 of a proleptic Gregorian calendar. This module turns that
//! count back into a `YYYY-MM-DD` string without going through a date
//! library, because year 0 and the day-table layout below must match the
//! game's own arithmetic exactly.

use std::fmt;

/// Days in a 400 year cycle (97 leap years).
const DAYS_IN_400_YEARS: u64 = 365 * 400 + 97;
/// Days in the first century after a multiple of 400 (25 leap years).
const DAYS_IN_LEAP_CENTURY: u64 = 365 * 100 + 25;
/// Days in any other century (24 leap years).
const DAYS_IN_CENTURY: u64 = 365 * 100 + 24;
/// Days in a 4 year block without a leap day.
const DAYS_IN_4_YEARS_NO_LEAP: u64 = 365 * 4;
/// Days in a regular 4 year block.
const DAYS_IN_4_YEARS: u64 = 365 * 4 + 1;
/// Day-of-year index of the 29th of February.
const LEAP_DAY_INDEX: u64 = 31 + 29 - 1;

/// Month lengths with a slot always reserved for the 29th of February.
const DAYS_IN_MONTH: [u64; 12] = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Number of days since the calendar epoch (0000-01-01).
pub type DayOrdinal = u64;

/// Gregorian leap year rule.
pub fn is_leap_year(year: u64) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

fn days_in_year(year: u64) -> u64 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

/// A decoded calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate {
    pub year: u64,
    /// 1..=12
    pub month: u8,
    /// 1..=31
    pub day: u8,
}

impl CalendarDate {
    /// Decode a day ordinal into a calendar date
    ///
    /// Total over all inputs: every ordinal maps to exactly one valid date.
    pub fn from_ordinal(ordinal: DayOrdinal) -> Self {
        // Large steps first, then the smaller ones.
        let mut year = 400 * (ordinal / DAYS_IN_400_YEARS);
        let mut remainder = ordinal % DAYS_IN_400_YEARS;

        if remainder >= DAYS_IN_LEAP_CENTURY {
            // Every 400th year is a leap year, so the first century has 25.
            year += 100;
            remainder -= DAYS_IN_LEAP_CENTURY;

            year += 100 * (remainder / DAYS_IN_CENTURY);
            remainder %= DAYS_IN_CENTURY;
        }

        if remainder >= DAYS_IN_4_YEARS_NO_LEAP && !is_leap_year(year) {
            // First 4 years of a non-leap century have no leap day.
            year += 4;
            remainder -= DAYS_IN_4_YEARS_NO_LEAP;
        }

        year += 4 * (remainder / DAYS_IN_4_YEARS);
        remainder %= DAYS_IN_4_YEARS;

        // At most 3 years left; only the first can be a leap year.
        while remainder >= days_in_year(year) {
            remainder -= days_in_year(year);
            year += 1;
        }

        // Skip the reserved 29th of February slot in non-leap years.
        if !is_leap_year(year) && remainder >= LEAP_DAY_INDEX {
            remainder += 1;
        }

        let mut month = 1u8;
        for days in DAYS_IN_MONTH {
            if remainder < days {
                break;
            }
            remainder -= days;
            month += 1;
        }

        Self {
            year,
            month,
            day: (remainder + 1) as u8,
        }
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

pub fn decode(ordinal: DayOrdinal) -> CalendarDate {
    CalendarDate::from_ordinal(ordinal)
}

/// Decode a day ordinal straight to its `YYYY-MM-DD` rendering
pub fn date_to_string(ordinal: DayOrdinal) -> String {
    decode(ordinal).to_string()
}
