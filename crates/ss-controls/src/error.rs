//! Error types for controller operations.

use ss_core::CoreError;
use thiserror::Error;

/// Result type for controller operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur while configuring or stepping a controller.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// A matrix or vector shape breaks the model invariants.
    #[error("Dimension mismatch: {what}")]
    DimensionMismatch { what: String },

    /// Invalid argument provided to a control function.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// NaN or infinite value where a finite one is required.
    #[error("Non-finite value for {what}: {value}")]
    NonFinite { what: &'static str, value: String },

    /// A model file could not be read or parsed.
    #[error("File format error: {what}")]
    FileFormat { what: String },
}

impl ControlError {
    pub(crate) fn dimension(what: impl Into<String>) -> Self {
        ControlError::DimensionMismatch { what: what.into() }
    }
}

impl From<CoreError> for ControlError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::NonFinite { what, value } => ControlError::NonFinite { what, value },
            CoreError::InvalidArg { what } => ControlError::InvalidArg { what },
            other => ControlError::DimensionMismatch {
                what: other.to_string(),
            },
        }
    }
}
