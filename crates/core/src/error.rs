//! Core Error Types
//!
//! Foundational error types shared across the MindMate workspace. Kept to
//! thiserror + std so the core crate stays lightweight; the application crate
//! wraps these in its own `AppError`.

use thiserror::Error;

/// Core error type for the MindMate workspace.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = CoreError::validation("timeout must be positive");
        assert_eq!(err.to_string(), "Validation error: timeout must be positive");
    }

    #[test]
    fn test_not_found_error() {
        let err = CoreError::not_found("emotion 'boredom'");
        assert_eq!(err.to_string(), "Not found: emotion 'boredom'");
    }
}
