use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiskError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Unknown industry: '{industry}' has no weight vector")]
    UnknownIndustry { industry: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Probability out of range: {value} is outside [0, 1]")]
    ProbabilityOutOfRange { value: Decimal },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Coarse error taxonomy carried by batch failure reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Configuration,
    Validation,
    DivisionByZero,
    Range,
    Data,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration => write!(f, "ConfigurationError"),
            Self::Validation => write!(f, "ValidationError"),
            Self::DivisionByZero => write!(f, "DivisionByZeroError"),
            Self::Range => write!(f, "RangeError"),
            Self::Data => write!(f, "DataError"),
        }
    }
}

impl RiskError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RiskError::Configuration(_) => ErrorCategory::Configuration,
            RiskError::MissingField { .. }
            | RiskError::InvalidInput { .. }
            | RiskError::UnknownIndustry { .. } => ErrorCategory::Validation,
            RiskError::DivisionByZero { .. } => ErrorCategory::DivisionByZero,
            RiskError::ProbabilityOutOfRange { .. } => ErrorCategory::Range,
            RiskError::InsufficientData(_) | RiskError::SerializationError(_) => {
                ErrorCategory::Data
            }
        }
    }
}

impl From<serde_json::Error> for RiskError {
    fn from(e: serde_json::Error) -> Self {
        RiskError::SerializationError(e.to_string())
    }
}
