//! Calendar arithmetic for recurring obligations.
//!
//! All functions here work on calendar dates only and are total: a step that
//! would leave chrono's representable range saturates at `NaiveDate::MAX`.

use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::ConfigurationError;

/// How often a recurring obligation repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }
}

impl FromStr for Frequency {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            _ => Err(ConfigurationError::UnknownFrequency(s.to_string())),
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Number of days in the given month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match (first, next_first) {
        (Some(first), Some(next)) => next.signed_duration_since(first).num_days() as u32,
        // December of the last representable year
        _ => 31,
    }
}

/// Add one calendar month, clamping to the last day of the target month when
/// the day does not exist there (Jan 31 -> Feb 28/29, Mar 31 -> Apr 30).
pub fn advance_by_one_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MAX)
}

/// Add one calendar year. Feb 29 falls back to Feb 28 in non-leap years.
pub fn advance_by_one_year(date: NaiveDate) -> NaiveDate {
    let year = date.year() + 1;
    let day = date.day().min(days_in_month(year, date.month()));
    NaiveDate::from_ymd_opt(year, date.month(), day).unwrap_or(NaiveDate::MAX)
}

/// Advance a date by exactly one step of `frequency`.
pub fn advance_by_frequency(date: NaiveDate, frequency: Frequency) -> NaiveDate {
    match frequency {
        Frequency::Daily => date.checked_add_days(Days::new(1)).unwrap_or(NaiveDate::MAX),
        Frequency::Weekly => date.checked_add_days(Days::new(7)).unwrap_or(NaiveDate::MAX),
        Frequency::Monthly => advance_by_one_month(date),
        Frequency::Yearly => advance_by_one_year(date),
    }
}

/// First date reachable from `anchor_date` by whole `frequency` steps that is
/// on or after `today`. Returns `anchor_date` unchanged when it is not in the
/// past.
///
/// Each step advances from the previously computed date, never re-anchoring
/// to the original day of month. A monthly schedule anchored on the 31st
/// therefore drifts: Jan 31 -> Feb 29 -> Mar 29 -> Apr 29 ... This matches
/// how stored schedules have always advanced and is kept on purpose.
pub fn compute_next_due_date(
    anchor_date: NaiveDate,
    frequency: Frequency,
    today: NaiveDate,
) -> NaiveDate {
    let mut next = anchor_date;
    while next < today {
        next = advance_by_frequency(next, frequency);
    }
    next
}

/// Iterator over a schedule's dates, starting with the anchor itself.
#[derive(Debug, Clone)]
pub struct Occurrences {
    next: Option<NaiveDate>,
    frequency: Frequency,
}

impl Iterator for Occurrences {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        let following = advance_by_frequency(current, self.frequency);
        // saturated at the end of the calendar
        self.next = (following > current).then_some(following);
        Some(current)
    }
}

pub fn occurrences(anchor_date: NaiveDate, frequency: Frequency) -> Occurrences {
    Occurrences {
        next: Some(anchor_date),
        frequency,
    }
}
