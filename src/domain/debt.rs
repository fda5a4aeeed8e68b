use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Amount, advance_by_one_month};

pub type DebtId = Uuid;

/// A loan or credit balance paid down in monthly instalments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debt {
    pub id: DebtId,
    pub name: String,
    pub total_amount: Amount,
    pub remaining_amount: Amount,
    pub monthly_payment: Amount,
    pub next_payment_date: NaiveDate,
}

impl Debt {
    pub fn new(
        name: impl Into<String>,
        total_amount: Amount,
        monthly_payment: Amount,
        next_payment_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            total_amount,
            remaining_amount: total_amount,
            monthly_payment,
            next_payment_date,
        }
    }

    /// Apply a payment: the balance never goes below zero and the next
    /// payment moves one month forward with month-end clamping.
    pub fn record_payment(&mut self, amount: Amount) {
        self.remaining_amount = self.remaining_amount.saturating_sub(amount);
        self.next_payment_date = advance_by_one_month(self.next_payment_date);
    }

    pub fn is_paid_off(&self) -> bool {
        self.remaining_amount.is_zero()
    }

    /// Share of the original total already repaid, 0-100.
    pub fn paid_percent(&self) -> f64 {
        self.total_amount
            .saturating_sub(self.remaining_amount)
            .percent_of(self.total_amount)
    }
}
