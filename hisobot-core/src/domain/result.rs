//! Result and error types for the core library

use rust_decimal::Decimal;
use thiserror::Error;

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    /// Remote classifier failure. Always recovered by the local
    /// fallback rules, never shown to the end user.
    #[error("Classification unavailable: {0}")]
    ClassificationUnavailable(String),

    #[error("Payment exceeds the outstanding debt, remaining: {remaining}")]
    Overpayment { remaining: Decimal },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overpayment_reports_remaining() {
        let err = Error::Overpayment {
            remaining: Decimal::from(20000),
        };
        assert!(err.to_string().contains("20000"));
    }

    #[test]
    fn test_helper_constructors() {
        assert!(matches!(Error::validation("bad"), Error::Validation(_)));
        assert!(matches!(Error::not_found("x"), Error::NotFound(_)));
    }
}
