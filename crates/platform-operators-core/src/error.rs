use thiserror::Error;

/// Core error types for API object handling
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid object name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unexpected kind: expected {expected}, found {actual}")]
    UnexpectedKind { expected: String, actual: String },

    #[error("Invalid object: {message}")]
    InvalidObject { message: String },
}

impl CoreError {
    /// Create a new InvalidName error
    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a new InvalidTime error
    pub fn invalid_time(message: impl Into<String>) -> Self {
        Self::InvalidTime(message.into())
    }

    /// Create a new UnexpectedKind error
    pub fn unexpected_kind(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::UnexpectedKind {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a new InvalidObject error
    pub fn invalid_object(message: impl Into<String>) -> Self {
        Self::InvalidObject {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
