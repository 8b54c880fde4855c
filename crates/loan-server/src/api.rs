//! API router and server setup
//!
//! Configures axum routes and runs the HTTP server.

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::handlers::{health_check, not_found, predict};
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// HTTP server around a shared loan predictor.
pub struct PredictionServer {
    config: ServerConfig,
    state: AppState,
}

impl PredictionServer {
    /// Server with no model loaded yet.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_state(config, AppState::new())
    }

    pub fn with_state(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Loads the bundle named by the configuration.
    pub fn load_model(&self) -> Result<()> {
        self.state.load_model(&self.config.model_path)?;
        Ok(())
    }

    /// Build the router
    pub fn router(&self) -> Router {
        let mut app = Router::new()
            .route("/api/predict", post(predict))
            .route("/api/health", get(health_check))
            .fallback(not_found)
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http());

        if self.config.cors_enabled {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            app = app.layer(cors);
        }

        app
    }

    /// Run the server
    pub async fn run(&self) -> Result<()> {
        let addr = self.config.address;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(format!("{}: {}", addr, e)))?;

        info!("Loan prediction server running on http://{}", addr);
        info!(
            "Model: {}",
            if self.state.is_model_loaded() { "loaded" } else { "not loaded" }
        );

        axum::serve(listener, self.router())
            .await
            .map_err(ServerError::Io)?;

        Ok(())
    }

    pub fn address(&self) -> SocketAddr {
        self.config.address
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }
}
