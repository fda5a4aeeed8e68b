use std::fmt;

/// An enum value outside the known set was supplied (from user input or from
/// stored data). Fatal to the call: there is no fallback value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    UnknownFrequency(String),
    UnknownRecordKind(String),
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::UnknownFrequency(value) => write!(
                f,
                "unknown frequency '{}' (expected daily, weekly, monthly or yearly)",
                value
            ),
            ConfigurationError::UnknownRecordKind(value) => write!(
                f,
                "unknown record kind '{}' (expected income or expense)",
                value
            ),
        }
    }
}

impl std::error::Error for ConfigurationError {}
