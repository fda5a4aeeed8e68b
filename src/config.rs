//! User settings persisted alongside the data, and process configuration.

use serde::{Deserialize, Serialize};

use crate::domain::{Amount, DEFAULT_ALERT_PERCENT};

/// Environment variable holding the database path when `--database` is absent.
pub const DATABASE_ENV: &str = "HISAB_DATABASE";

/// Default database file.
pub const DEFAULT_DATABASE: &str = "hisab.db";

/// Preferences stored under the settings key. Every field has a default so
/// older or partial documents still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Declared monthly income. When non-zero it replaces recorded income as
    /// the base for the monthly savings figure.
    #[serde(default)]
    pub monthly_income: Amount,

    /// Display-only currency code.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Percentage of a budget at which it is flagged.
    #[serde(default = "default_alert_percent")]
    pub budget_alert_percent: u8,

    /// How far ahead "upcoming" obligations are listed.
    #[serde(default = "default_upcoming_window")]
    pub upcoming_window_days: u32,

    /// Expense records required before asking for budget suggestions.
    #[serde(default = "default_min_expenses")]
    pub min_expenses_for_suggestions: usize,
}

fn default_currency() -> String {
    "MAD".to_string()
}

fn default_alert_percent() -> u8 {
    DEFAULT_ALERT_PERCENT
}

fn default_upcoming_window() -> u32 {
    30
}

fn default_min_expenses() -> usize {
    5
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            monthly_income: Amount::ZERO,
            currency: default_currency(),
            budget_alert_percent: default_alert_percent(),
            upcoming_window_days: default_upcoming_window(),
            min_expenses_for_suggestions: default_min_expenses(),
        }
    }
}

impl Settings {
    /// Update one setting from its textual key and value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        let invalid = || SettingsError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        match key {
            "monthly_income" => self.monthly_income = value.parse().map_err(|_| invalid())?,
            "currency" => self.currency = value.trim().to_uppercase(),
            "budget_alert_percent" => {
                let percent: u8 = value.parse().map_err(|_| invalid())?;
                if percent == 0 || percent > 100 {
                    return Err(invalid());
                }
                self.budget_alert_percent = percent;
            }
            "upcoming_window_days" => {
                self.upcoming_window_days = value.parse().map_err(|_| invalid())?
            }
            "min_expenses_for_suggestions" => {
                self.min_expenses_for_suggestions = value.parse().map_err(|_| invalid())?
            }
            _ => return Err(SettingsError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("Unknown setting: {0}")]
    UnknownKey(String),

    #[error("Invalid value '{value}' for setting {key}")]
    InvalidValue { key: String, value: String },
}
