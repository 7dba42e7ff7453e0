//! Error types for filter execution
//!
//! | Variant | Raised when |
//! |---------|-------------|
//! | `Data` | a graph or store operation failed inside execute |
//! | `Apply` | an action of the validated list could not be applied |
//! | `Execution` | the filter's own kernel reported a failure |
//! | `Multiple` | several independent failures were collected |
//!
//! Validation problems never surface here; they are diagnostics inside a
//! [`ValidationResult`](crate::ValidationResult).

use crate::result::{ApplyError, Diagnostic};
use thiserror::Error;

/// Result alias for filter execution
pub type FilterResult<T> = std::result::Result<T, FilterError>;

/// Failure of a filter's execute step
#[derive(Debug, Error)]
pub enum FilterError {
    /// Graph or store fault
    #[error("data error: {0}")]
    Data(#[from] tessera_core::Error),

    /// Action application fault
    #[error("apply error: {0}")]
    Apply(#[from] ApplyError),

    /// Kernel fault with a filter-specific code
    #[error("execution failed [{code}]: {message}")]
    Execution {
        /// Numeric code
        code: i32,
        /// Description
        message: String,
    },

    /// Several faults
    #[error("{} errors, first: {}", .0.len(), first_message(.0))]
    Multiple(Vec<Diagnostic>),
}

fn first_message(diagnostics: &[Diagnostic]) -> &str {
    diagnostics.first().map_or("", |d| d.message.as_str())
}

impl FilterError {
    /// Build an `Execution` error
    pub fn execution(code: i32, message: impl Into<String>) -> Self {
        FilterError::Execution {
            code,
            message: message.into(),
        }
    }

    /// Diagnostics describing this error
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            FilterError::Data(e) => vec![Diagnostic::from(e)],
            FilterError::Apply(e) => vec![Diagnostic::new(e.source.code(), e.to_string())],
            FilterError::Execution { code, message } => vec![Diagnostic::new(*code, message.clone())],
            FilterError::Multiple(diagnostics) => diagnostics.clone(),
        }
    }
}
