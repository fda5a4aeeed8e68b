use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    Amount, CategoryId, Frequency, MonetaryRecord, RecordKind, advance_by_frequency,
    compute_next_due_date,
};

pub type ObligationId = Uuid;

/// Prefix given to the label of records materialized from an obligation.
pub const RECURRING_LABEL_PREFIX: &str = "(recurring) ";

/// A recurring bill or income that has not been materialized yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringObligation {
    pub id: ObligationId,
    pub kind: RecordKind,
    pub amount: Amount,
    pub category_id: CategoryId,
    pub label: String,
    pub frequency: Frequency,
    /// Date of the last fired occurrence; the start date until the first firing.
    pub anchor_date: NaiveDate,
    /// Derived. Never before "today" at the moment it was computed.
    pub next_due_date: NaiveDate,
}

impl RecurringObligation {
    /// Create an obligation and settle its first due date against `today`.
    pub fn new(
        kind: RecordKind,
        amount: Amount,
        category_id: impl Into<CategoryId>,
        label: impl Into<String>,
        frequency: Frequency,
        anchor_date: NaiveDate,
        today: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            amount,
            category_id: category_id.into(),
            label: label.into(),
            frequency,
            anchor_date,
            next_due_date: compute_next_due_date(anchor_date, frequency, today),
        }
    }

    /// Change frequency and anchor, recomputing the next due date.
    pub fn reschedule(&mut self, frequency: Frequency, anchor_date: NaiveDate, today: NaiveDate) {
        self.frequency = frequency;
        self.anchor_date = anchor_date;
        self.next_due_date = compute_next_due_date(anchor_date, frequency, today);
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.next_due_date <= today
    }

    /// Due after today but within `window_days` of it.
    pub fn is_upcoming(&self, today: NaiveDate, window_days: u32) -> bool {
        let horizon = today
            .checked_add_days(Days::new(window_days.into()))
            .unwrap_or(NaiveDate::MAX);
        self.next_due_date > today && self.next_due_date <= horizon
    }

    /// Materialize one occurrence as a record stamped `now`, then advance the
    /// schedule: the fired occurrence becomes the anchor, and the next due
    /// date is one step past it, caught up to today.
    pub fn fire(&mut self, now: DateTime<Utc>) -> MonetaryRecord {
        let record = MonetaryRecord::new(
            self.kind,
            self.amount,
            self.category_id.clone(),
            now,
            format!("{}{}", RECURRING_LABEL_PREFIX, self.label),
        );

        self.anchor_date = self.next_due_date;
        let stepped = advance_by_frequency(self.anchor_date, self.frequency);
        self.next_due_date = compute_next_due_date(stepped, self.frequency, now.date_naive());
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn rent(anchor: &str, today: &str) -> RecurringObligation {
        RecurringObligation::new(
            RecordKind::Expense,
            Amount::from_cents(120_000),
            "cat-3",
            "Rent",
            Frequency::Monthly,
            date(anchor),
            date(today),
        )
    }

    #[test]
    fn test_new_settles_due_date() {
        let obligation = rent("2024-01-31", "2024-03-01");
        assert_eq!(obligation.next_due_date, date("2024-03-29"));
        assert_eq!(obligation.anchor_date, date("2024-01-31"));
    }

    #[test]
    fn test_future_anchor_is_kept() {
        let obligation = rent("2024-06-01", "2024-03-01");
        assert_eq!(obligation.next_due_date, date("2024-06-01"));
        assert!(!obligation.is_due(date("2024-03-01")));
    }

    #[test]
    fn test_fire_advances_past_today() {
        let mut obligation = rent("2024-03-15", "2024-03-15");
        assert!(obligation.is_due(date("2024-03-15")));

        let now = date("2024-03-15").and_hms_opt(9, 30, 0).unwrap().and_utc();
        let record = obligation.fire(now);

        assert_eq!(record.kind, RecordKind::Expense);
        assert_eq!(record.amount, Amount::from_cents(120_000));
        assert_eq!(record.category_id, "cat-3");
        assert_eq!(record.label, "(recurring) Rent");
        assert_eq!(record.timestamp, now);
        assert_eq!(obligation.anchor_date, date("2024-03-15"));
        assert_eq!(obligation.next_due_date, date("2024-04-15"));
        assert!(!obligation.is_due(date("2024-03-15")));
    }

    #[test]
    fn test_fire_catches_up_long_overdue() {
        let mut obligation = rent("2024-01-10", "2024-01-10");
        let now = date("2024-05-20").and_hms_opt(8, 0, 0).unwrap().and_utc();
        obligation.fire(now);
        assert_eq!(obligation.anchor_date, date("2024-01-10"));
        assert_eq!(obligation.next_due_date, date("2024-06-10"));
    }

    #[test]
    fn test_reschedule() {
        let mut obligation = rent("2024-01-31", "2024-03-01");
        obligation.reschedule(Frequency::Weekly, date("2024-02-26"), date("2024-03-01"));
        assert_eq!(obligation.frequency, Frequency::Weekly);
        assert_eq!(obligation.next_due_date, date("2024-03-04"));
    }

    #[test]
    fn test_is_upcoming() {
        let obligation = rent("2024-04-10", "2024-03-20");
        assert!(obligation.is_upcoming(date("2024-03-20"), 30));
        assert!(!obligation.is_upcoming(date("2024-03-20"), 7));
        assert!(!obligation.is_upcoming(date("2024-04-10"), 30));
    }
}
