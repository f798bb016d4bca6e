//! Loan Predictor - serves a pre-trained loan default classifier over HTTP.
//!
//! A client posts raw applicant attributes to `/predict`; the service derives
//! nine engineered ratio features, runs them through a gradient boosted
//! classifier loaded once at start-up, and answers with the predicted label.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  HTTP: POST /predict | GET /health        (axum)         │
//! ├──────────────────────────────────────────────────────────┤
//! │  Request: JSON parse → field validation → features       │
//! ├──────────────────────────────────────────────────────────┤
//! │  Model: Arc<dyn Classifier>, immutable after load        │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use loan_predictor::config::PredictorConfig;
//!
//! #[tokio::main]
//! async fn main() -> loan_predictor::Result<()> {
//!     let config = PredictorConfig::development();
//!     loan_predictor::observability::init(&config.observability)?;
//!     loan_predictor::run(config).await
//! }
//! ```

pub mod cli;
pub mod compute;
pub mod config;
pub mod error;
pub mod health;
pub mod observability;
pub mod shutdown;

// Re-exports
pub use error::{PredictorError, Result};

use compute::{Classifier, GradientBoostingClassifier, PredictionServer};
use config::{ModelConfig, PredictorConfig};
use shutdown::{ShutdownCoordinator, SignalHandler};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Load the classifier artifact named by the configuration.
///
/// Any failure here is fatal: the service never starts without a model.
pub fn load_model(config: &ModelConfig) -> Result<Arc<dyn Classifier>> {
    let model = GradientBoostingClassifier::load(&config.path)?;
    Ok(Arc::new(model))
}

/// Run the prediction service with the given configuration.
///
/// Logging must already be initialised (see [`observability::init`]).
pub async fn run(config: PredictorConfig) -> Result<()> {
    config.validate()?;
    info!(bind = %config.server.bind_addr, model = %config.model.path.display(), "Starting loan predictor");

    let metrics = if config.observability.metrics_enabled {
        let handle = observability::install_recorder()?;
        let listener = observability::bind_metrics(&config.observability).await?;
        Some((listener, handle))
    } else {
        None
    };

    let model = load_model(&config.model)?;
    observability::record_model_loaded(model.summary().n_trees);

    let coordinator = ShutdownCoordinator::with_timeout(config.server.shutdown_timeout);

    let metrics_task = metrics.map(|(listener, handle)| {
        tokio::spawn(async move {
            if let Err(e) = observability::serve_metrics(listener, handle).await {
                error!("Metrics server error: {}", e);
            }
        })
    });

    let server = PredictionServer::new(config.server.clone(), model);
    let listener = server.bind().await?;

    // Start signal handler in background
    let signal_coordinator = coordinator.clone();
    tokio::spawn(async move {
        if let Err(e) = SignalHandler::new(signal_coordinator.clone()).run().await {
            error!("Signal handler error: {}", e);
            signal_coordinator.shutdown();
        }
    });

    let mut server_task = tokio::spawn(server.serve(listener, coordinator.clone()));

    tokio::select! {
        result = &mut server_task => {
            if let Some(task) = metrics_task {
                task.abort();
            }
            return result.map_err(|e| PredictorError::Internal(e.to_string()))?;
        }
        _ = coordinator.wait_for_shutdown() => {}
    }

    info!("Shutting down loan predictor gracefully...");

    match tokio::time::timeout(coordinator.timeout(), &mut server_task).await {
        Ok(result) => result.map_err(|e| PredictorError::Internal(e.to_string()))??,
        Err(_) => {
            warn!(timeout = ?coordinator.timeout(), "In-flight requests did not drain, aborting");
            server_task.abort();
        }
    }

    if let Some(task) = metrics_task {
        task.abort();
    }

    info!("Loan predictor shutdown complete");
    Ok(())
}
