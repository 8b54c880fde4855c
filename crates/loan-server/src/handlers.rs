//! Request handlers.

use crate::error::ApiError;
use crate::request::{ApplicantData, PredictRequest};
use crate::state::AppState;
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use serde_json::json;
use tracing::info;

/// Probabilities outside `[0.3, 0.7]` are reported as high confidence.
const HIGH_CONFIDENCE_ABOVE: f64 = 0.7;
const HIGH_CONFIDENCE_BELOW: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictResponse {
    pub success: bool,
    /// `"Y"` or `"N"`.
    pub prediction: &'static str,
    /// Approval probability in percent, two decimals.
    pub probability: f64,
    /// `"approved"` or `"rejected"`.
    pub status: &'static str,
    /// `"high"` or `"moderate"`.
    pub confidence: &'static str,
    pub applicant_data: ApplicantData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub version: &'static str,
}

/// `POST /api/predict`
pub async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PredictResponse>, ApiError> {
    if !state.is_model_loaded() {
        return Err(ApiError::ModelNotLoaded);
    }

    let request = PredictRequest::from_json(&body)?;
    info!("Received prediction request: {:?}", request);

    let record = request.to_record();
    let predictor = state.predictor();
    let result = tokio::task::spawn_blocking(move || {
        let guard = predictor.read();
        let predictor = guard.as_ref().ok_or(ApiError::ModelNotLoaded)?;
        predictor.predict_loan(&record).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Prediction task failed: {}", e)))??;

    let response = PredictResponse {
        success: true,
        prediction: if result.approved { "Y" } else { "N" },
        probability: round_percent(result.probability),
        status: if result.approved { "approved" } else { "rejected" },
        confidence: confidence(result.probability),
        applicant_data: request.applicant_data(),
    };

    info!(
        "Prediction result: {} ({}%, {} confidence)",
        response.prediction, response.probability, response.confidence
    );
    Ok(Json(response))
}

/// `GET /api/health`
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        model_loaded: state.is_model_loaded(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Fallback for unknown routes.
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Endpoint not found" })),
    )
}

fn round_percent(probability: f64) -> f64 {
    (probability * 100.0 * 100.0).round() / 100.0
}

fn confidence(probability: f64) -> &'static str {
    if probability > HIGH_CONFIDENCE_ABOVE || probability < HIGH_CONFIDENCE_BELOW {
        "high"
    } else {
        "moderate"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_percent() {
        assert_eq!(round_percent(0.87654), 87.65);
        assert_eq!(round_percent(1.0), 100.0);
        assert_eq!(round_percent(0.0), 0.0);
    }

    #[test]
    fn test_confidence_boundaries() {
        assert_eq!(confidence(0.71), "high");
        assert_eq!(confidence(0.29), "high");
        assert_eq!(confidence(0.7), "moderate");
        assert_eq!(confidence(0.3), "moderate");
        assert_eq!(confidence(0.5), "moderate");
    }
}
