//! Error types for forms.

use thiserror::Error;

/// Form-specific errors.
#[derive(Debug, Error)]
pub enum FormError {
    /// A field was configured without a name.
    #[error("field name must not be empty (label: {label:?})")]
    MissingName { label: String },

    /// A validator pattern did not compile.
    #[error("invalid validator pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Validation was started outside a tokio runtime.
    #[error("no tokio runtime to run validators on: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    /// A validation run task did not complete.
    #[error("validation run for field {field} was aborted: {message}")]
    RunAborted { field: String, message: String },
}

/// A validator predicate that could not produce a verdict.
///
/// Faults are logged and swallowed by the field controller; they never
/// become a user-facing error message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidatorFault {
    /// What went wrong.
    pub message: String,
}

impl ValidatorFault {
    /// Creates a new fault.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for ValidatorFault {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Result type alias for form operations.
pub type Result<T> = std::result::Result<T, FormError>;
