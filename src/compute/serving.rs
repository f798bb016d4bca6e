// Prediction HTTP Serving

use super::features::LoanApplication;
use super::model::Classifier;
use crate::config::ServerConfig;
use crate::error::{ErrorPolicy, PredictorError, Result};
use crate::health::HealthResponse;
use crate::observability;
use crate::shutdown::ShutdownCoordinator;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Shared state for prediction handlers.
#[derive(Clone)]
pub struct AppState {
    /// Loaded classifier, read-only for the process lifetime.
    model: Arc<dyn Classifier>,
    /// Status code mapping for request failures.
    error_policy: ErrorPolicy,
}

impl AppState {
    pub fn new(model: Arc<dyn Classifier>, error_policy: ErrorPolicy) -> Self {
        Self { model, error_policy }
    }

    pub fn model(&self) -> &dyn Classifier {
        self.model.as_ref()
    }
}

/// Successful prediction body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: i64,
}

/// Error envelope returned for every failed request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A request failure paired with the policy deciding its status code.
#[derive(Debug)]
pub struct ApiError {
    error: PredictorError,
    policy: ErrorPolicy,
}

impl ApiError {
    pub fn new(error: PredictorError, policy: ErrorPolicy) -> Self {
        Self { error, policy }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.status_code(self.policy))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse {
            error: self.error.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Runs the whole request pipeline: parse, extract, derive, infer.
pub fn predict_json(model: &dyn Classifier, body: &[u8]) -> Result<PredictResponse> {
    let application = LoanApplication::from_json_bytes(body)?;
    let features = application.features()?;
    let prediction = model.predict(features.as_slice())?;
    Ok(PredictResponse { prediction })
}

/// Builds the API router.
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/predict", post(handle_predict))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// API Handlers

async fn handle_predict(
    State(state): State<AppState>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Response {
    let start = Instant::now();

    let outcome = body
        .map_err(|rejection| {
            PredictorError::BadRequest(format!("request body rejected: {}", rejection.body_text()))
        })
        .and_then(|body| predict_json(state.model(), &body));

    match outcome {
        Ok(response) => {
            let latency = start.elapsed();
            debug!(
                prediction = response.prediction,
                latency_us = latency.as_micros() as u64,
                "Prediction served"
            );
            observability::record_prediction(response.prediction, latency);
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            warn!(error = %e, kind = e.kind(), "Prediction failed");
            observability::record_prediction_error(&e);
            ApiError::new(e, state.error_policy).into_response()
        }
    }
}

async fn handle_health() -> Response {
    (StatusCode::OK, Json(HealthResponse::healthy())).into_response()
}

/// Prediction HTTP server
pub struct PredictionServer {
    /// Server config
    config: ServerConfig,
    /// Handler state
    state: AppState,
}

impl PredictionServer {
    /// Creates a new server around a loaded model.
    pub fn new(config: ServerConfig, model: Arc<dyn Classifier>) -> Self {
        let state = AppState::new(model, config.error_policy);
        Self { config, state }
    }

    /// Builds the router for this server.
    pub fn router(&self) -> Router {
        router(self.state.clone(), self.config.max_body_bytes)
    }

    /// Binds the configured address.
    pub async fn bind(&self) -> Result<TcpListener> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        Ok(listener)
    }

    /// Serves until the coordinator signals shutdown.
    pub async fn serve(self, listener: TcpListener, coordinator: ShutdownCoordinator) -> Result<()> {
        let addr = listener.local_addr()?;
        info!(addr = %addr, policy = ?self.config.error_policy, "Prediction server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { coordinator.wait_for_shutdown().await })
            .await
            .map_err(|e| PredictorError::Network(e.to_string()))?;

        info!("Prediction server stopped");
        Ok(())
    }
}
