//! Health check responses.
//!
//! The health check reports process liveness only. It never inspects the
//! model, so it stays green regardless of earlier prediction failures.

use serde::{Deserialize, Serialize};

/// Liveness reported by `GET /health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Process is up and serving requests.
    Healthy,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: HealthStatus,
}

impl HealthResponse {
    /// Create a healthy response.
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
        }
    }
}
