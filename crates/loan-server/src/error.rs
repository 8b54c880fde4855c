//! Error types for the HTTP boundary.
//!
//! [`ApiError`] is what a request handler can fail with; it renders itself as
//! a JSON body with the matching status code. [`ServerError`] covers startup
//! and the serve loop.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use loan_predictor::LoanPredictorError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Request-level failure.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Required request keys were absent.
    #[error("Missing required fields: {0:?}")]
    MissingFields(Vec<String>),

    /// Malformed body or a value the model cannot accept.
    #[error("{0}")]
    BadRequest(String),

    /// No model bundle has been loaded.
    #[error("Model not loaded")]
    ModelNotLoaded,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingFields(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ModelNotLoaded | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<LoanPredictorError> for ApiError {
    fn from(err: LoanPredictorError) -> Self {
        match err {
            LoanPredictorError::NotTrained => ApiError::ModelNotLoaded,
            e if e.is_client_error() => ApiError::BadRequest(e.to_string()),
            e => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        let body = match &self {
            ApiError::MissingFields(fields) => json!({
                "success": false,
                "error": message,
                "missing_fields": fields,
            }),
            ApiError::Internal(_) => {
                error!("Prediction error: {}", message);
                json!({ "success": false, "error": message })
            }
            _ => json!({ "success": false, "error": message }),
        };

        (status, Json(body)).into_response()
    }
}

/// Startup and serve-loop failure.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind: {0}")]
    Bind(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Model(#[from] LoanPredictorError),
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::MissingFields(vec!["gender".into()]).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::BadRequest("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::ModelNotLoaded.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_core_error_mapping() {
        let unknown = LoanPredictorError::UnknownCategory {
            column: "Property_Area".into(),
            value: "Suburban".into(),
        };
        assert!(matches!(ApiError::from(unknown), ApiError::BadRequest(_)));
        assert!(matches!(
            ApiError::from(LoanPredictorError::NotTrained),
            ApiError::ModelNotLoaded
        ));
        assert!(matches!(
            ApiError::from(LoanPredictorError::TrainingFailed("x".into())),
            ApiError::Internal(_)
        ));
    }

    #[test]
    fn test_missing_fields_message() {
        let err = ApiError::MissingFields(vec!["gender".into(), "married".into()]);
        assert_eq!(
            err.to_string(),
            "Missing required fields: [\"gender\", \"married\"]"
        );
    }
}
