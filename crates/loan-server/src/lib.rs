//! HTTP API for loan approval predictions.
//!
//! Serves a [`LoanPredictor`](loan_predictor::LoanPredictor) loaded from a
//! model bundle. Requests carry applicant data in user-facing units (annual
//! incomes, loan amount in dollars) and are converted to the units the model
//! was trained on before scoring.
//!
//! # Endpoints
//!
//! | Method | Path           | Description                         |
//! |--------|----------------|-------------------------------------|
//! | POST   | `/api/predict` | Score one applicant                 |
//! | GET    | `/api/health`  | Liveness and model status           |
//!
//! Any other path answers `404 {"error": "Endpoint not found"}`.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use loan_server::{PredictionServer, ServerConfig};
//!
//! let server = PredictionServer::new(ServerConfig::default());
//! if let Err(e) = server.load_model() {
//!     tracing::error!("Error loading model: {}", e);
//! }
//! server.run().await?;
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod handlers;
pub mod request;
pub mod state;

// Re-exports for convenient access
pub use api::PredictionServer;
pub use config::ServerConfig;
pub use error::{ApiError, Result, ServerError};
pub use request::{ApplicantData, PredictRequest};
pub use state::AppState;
