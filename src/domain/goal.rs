use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Amount;

pub type GoalId = Uuid;

/// A savings target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub name: String,
    pub target_amount: Amount,
    pub current_amount: Amount,
}

impl Goal {
    pub fn new(name: impl Into<String>, target_amount: Amount) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            target_amount,
            current_amount: Amount::ZERO,
        }
    }

    pub fn contribute(&mut self, amount: Amount) {
        self.current_amount += amount;
    }

    /// Progress towards the target, capped at 100.
    pub fn progress_percent(&self) -> f64 {
        self.current_amount
            .percent_of(self.target_amount)
            .min(100.0)
    }

    pub fn is_reached(&self) -> bool {
        !self.target_amount.is_zero() && self.current_amount >= self.target_amount
    }
}
