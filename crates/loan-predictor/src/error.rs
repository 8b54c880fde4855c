//! Error types for the loan prediction pipeline.
//!
//! This module provides the error hierarchy using `thiserror`. Every variant
//! maps to a stable code via [`LoanPredictorError::error_code`], and errors
//! serialize as `{code, message}` so a boundary layer can forward them as-is.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the loan prediction pipeline.
#[derive(Error, Debug)]
pub enum LoanPredictorError {
    /// Input record or batch is missing fields or holds malformed values.
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        /// Names of the offending fields, empty when the problem is not field-specific.
        fields: Vec<String>,
    },

    /// A categorical value was never seen while fitting the encoders.
    #[error("Unknown category '{value}' for column '{column}'")]
    UnknownCategory { column: String, value: String },

    /// Inference or persistence was requested before training or loading.
    #[error("Model not trained yet. Call train_models() or load_model() first")]
    NotTrained,

    /// The persisted bundle could not be read or is incomplete.
    #[error("Corrupt model bundle at '{path}': {reason}")]
    CorruptBundle { path: String, reason: String },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The training dataset cannot be used.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A candidate model failed to fit.
    #[error("Training failed: {0}")]
    TrainingFailed(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LoanPredictorError {
    /// Validation error listing fields that were absent from the input.
    pub fn missing_fields(fields: Vec<String>) -> Self {
        Self::Validation {
            message: format!("Missing required fields: {:?}", fields),
            fields,
        }
    }

    /// Validation error for a single malformed field.
    pub fn invalid_field(field: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        let field = field.into();
        Self::Validation {
            message: format!("Invalid value for '{}': {}", field, reason),
            fields: vec![field],
        }
    }

    /// Get error code for boundary handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::UnknownCategory { .. } => "UNKNOWN_CATEGORY",
            Self::NotTrained => "NOT_TRAINED",
            Self::CorruptBundle { .. } => "CORRUPT_BUNDLE",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::InvalidData(_) => "INVALID_DATA",
            Self::TrainingFailed(_) => "TRAINING_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
        }
    }

    /// Whether the error was caused by the caller's input rather than the pipeline.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::UnknownCategory { .. })
    }
}

impl Serialize for LoanPredictorError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("LoanPredictorError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, LoanPredictorError>;
