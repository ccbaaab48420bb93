//! Error types for the fiscal rule engine

use thiserror::Error;

/// Errors surfaced by evaluation, configuration and scenario loading
#[derive(Debug, Error)]
pub enum FiscalRuleError {
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FiscalRuleError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        FiscalRuleError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

pub type FiscalRuleResult<T> = Result<T, FiscalRuleError>;
