use thiserror::Error;

use crate::config::SettingsError;
use crate::domain::{ConfigurationError, ParseAmountError};

use super::SuggestionError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid date range: {start} is after {end}")]
    InvalidRange { start: String, end: String },

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Recurring obligation not found: {0}")]
    ObligationNotFound(String),

    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    #[error("Category already exists: {0}")]
    CategoryAlreadyExists(String),

    #[error("Debt not found: {0}")]
    DebtNotFound(String),

    #[error("Goal not found: {0}")]
    GoalNotFound(String),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Suggestion(#[from] SuggestionError),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<ParseAmountError> for AppError {
    fn from(err: ParseAmountError) -> Self {
        AppError::InvalidAmount(err.to_string())
    }
}
