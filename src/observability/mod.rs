//! Observability module for the prediction service.
//!
//! Provides logging initialisation, Prometheus metrics and the recording
//! helpers used on the request path.

use crate::config::ObservabilityConfig;
use crate::error::{PredictorError, Result};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use axum::{routing::get, Router};
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Prediction outcome counter.
pub const PREDICTIONS_TOTAL: &str = "loan_predictor_predictions_total";
/// Prediction latency histogram.
pub const PREDICTION_LATENCY: &str = "loan_predictor_prediction_latency_seconds";
/// Number of trees in the loaded ensemble.
pub const MODEL_TREES: &str = "loan_predictor_model_trees";

/// Histogram buckets for prediction latency (in seconds).
pub const LATENCY_BUCKETS: [f64; 10] = [
    0.00001, // 10µs
    0.00005, // 50µs
    0.0001,  // 100µs
    0.0005,  // 500µs
    0.001,   // 1ms
    0.005,   // 5ms
    0.01,    // 10ms
    0.05,    // 50ms
    0.1,     // 100ms
    1.0,     // 1s
];

/// Initialize logging.
pub fn init(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json())
            .try_init()
            .map_err(|e| PredictorError::Internal(format!("Failed to init logging: {}", e)))?;
    } else {
        subscriber
            .with(fmt::layer())
            .try_init()
            .map_err(|e| PredictorError::Internal(format!("Failed to init logging: {}", e)))?;
    }

    info!("Observability initialized");
    Ok(())
}

fn prometheus_builder() -> Result<PrometheusBuilder> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(PREDICTION_LATENCY.to_string()), &LATENCY_BUCKETS)
        .map_err(|e| PredictorError::Internal(format!("Invalid histogram buckets: {}", e)))
}

/// Install the global Prometheus recorder.
pub fn install_recorder() -> Result<PrometheusHandle> {
    prometheus_builder()?
        .install_recorder()
        .map_err(|e| PredictorError::Internal(format!("Failed to install metrics recorder: {}", e)))
}

/// Bind the metrics listener.
///
/// Called during start-up so a taken port fails the process like the API bind.
pub async fn bind_metrics(config: &ObservabilityConfig) -> Result<TcpListener> {
    let listener = TcpListener::bind(config.metrics_addr).await?;
    info!(addr = %listener.local_addr()?, "Metrics server listening");
    Ok(listener)
}

/// Router exposing `/metrics` in Prometheus text format.
pub fn metrics_router(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

/// Serve rendered metrics on an already bound listener.
pub async fn serve_metrics(listener: TcpListener, handle: PrometheusHandle) -> Result<()> {
    axum::serve(listener, metrics_router(handle))
        .await
        .map_err(|e| PredictorError::Network(e.to_string()))
}

/// Record the loaded model's shape.
pub fn record_model_loaded(trees: usize) {
    gauge!(MODEL_TREES).set(trees as f64);
}

/// Record a successful prediction.
pub fn record_prediction(label: i64, latency: Duration) {
    counter!(
        PREDICTIONS_TOTAL,
        "outcome" => "success",
        "label" => label.to_string()
    )
    .increment(1);
    histogram!(PREDICTION_LATENCY).record(latency.as_secs_f64());
}

/// Record a failed prediction.
pub fn record_prediction_error(err: &PredictorError) {
    counter!(
        PREDICTIONS_TOTAL,
        "outcome" => "error",
        "kind" => err.kind()
    )
    .increment(1);
}
