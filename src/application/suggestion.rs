//! Boundary to the external spending-suggestion service.
//!
//! No implementation lives in this crate. The service may be offline,
//! unconfigured, or refuse to answer for lack of data; its errors reach the
//! caller unchanged.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Category, CategoryId, MonetaryRecord};

/// A suggested monthly budget for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSuggestion {
    /// Category display name as returned by the service.
    pub category: String,
    pub suggested_amount: f64,
    pub reason: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SuggestionError {
    #[error("You are offline. This feature needs a network connection.")]
    Offline,

    #[error("Suggestions are not available right now. Please try again later.")]
    NotConfigured,

    #[error("At least {required} expense records are needed for suggestions (found {found}).")]
    InsufficientData { required: usize, found: usize },

    #[error("The suggestion service returned an invalid response: {0}")]
    InvalidResponse(String),
}

#[allow(async_fn_in_trait)]
pub trait SuggestionService {
    async fn suggest_budgets(
        &self,
        records: &[MonetaryRecord],
        categories: &[Category],
    ) -> Result<Vec<BudgetSuggestion>, SuggestionError>;

    async fn suggest_category(
        &self,
        label: &str,
        categories: &[Category],
    ) -> Result<CategoryId, SuggestionError>;

    async fn analyze_spending(
        &self,
        records: &[MonetaryRecord],
        categories: &[Category],
    ) -> Result<String, SuggestionError>;
}

/// Refuse early when there are fewer than `minimum` expense records.
pub fn ensure_enough_expenses(
    records: &[MonetaryRecord],
    minimum: usize,
) -> Result<(), SuggestionError> {
    let found = records.iter().filter(|r| r.is_expense()).count();
    if found < minimum {
        return Err(SuggestionError::InsufficientData {
            required: minimum,
            found,
        });
    }
    Ok(())
}
