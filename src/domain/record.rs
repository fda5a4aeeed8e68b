use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Amount, CategoryId, ConfigurationError};

pub type RecordId = Uuid;

/// Direction of money for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Income,
    Expense,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Income => "income",
            RecordKind::Expense => "expense",
        }
    }
}

impl FromStr for RecordKind {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(RecordKind::Income),
            "expense" => Ok(RecordKind::Expense),
            _ => Err(ConfigurationError::UnknownRecordKind(s.to_string())),
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A dated, categorized income or expense. The unit both the scheduler and
/// the aggregator operate on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonetaryRecord {
    pub id: RecordId,
    pub kind: RecordKind,
    pub amount: Amount,
    /// May reference a category that no longer exists.
    pub category_id: CategoryId,
    pub timestamp: DateTime<Utc>,
    pub label: String,
}

impl MonetaryRecord {
    pub fn new(
        kind: RecordKind,
        amount: Amount,
        category_id: impl Into<CategoryId>,
        timestamp: DateTime<Utc>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            amount,
            category_id: category_id.into(),
            timestamp,
            label: label.into(),
        }
    }

    pub fn income(
        amount: Amount,
        category_id: impl Into<CategoryId>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(RecordKind::Income, amount, category_id, timestamp, "")
    }

    pub fn expense(
        amount: Amount,
        category_id: impl Into<CategoryId>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(RecordKind::Expense, amount, category_id, timestamp, "")
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// The UTC calendar date used for range membership; time of day is ignored.
    pub fn calendar_date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    pub fn is_income(&self) -> bool {
        self.kind == RecordKind::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == RecordKind::Expense
    }
}
