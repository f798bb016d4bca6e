//! Configuration module for the prediction service.

use crate::error::{ErrorPolicy, PredictorError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of the classifier artifact.
pub const DEFAULT_MODEL_PATH: &str = "models/best_gb_model.json";

/// Main configuration for a prediction service process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictorConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Model artifact configuration.
    #[serde(default)]
    pub model: ModelConfig,
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl PredictorConfig {
    /// Load configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PredictorError::Config(format!("Failed to read config file: {}", e))
        })?;

        let config: Self = serde_json::from_str(&content).map_err(|e| {
            PredictorError::Config(format!("Failed to parse config: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.model.path.as_os_str().is_empty() {
            return Err(PredictorError::InvalidConfig {
                field: "model.path".to_string(),
                reason: "Model path must not be empty".to_string(),
            });
        }

        if self.server.max_body_bytes == 0 {
            return Err(PredictorError::InvalidConfig {
                field: "server.max_body_bytes".to_string(),
                reason: "Body limit must be non-zero".to_string(),
            });
        }

        if self.observability.metrics_enabled
            && self.observability.metrics_addr == self.server.bind_addr
        {
            return Err(PredictorError::InvalidConfig {
                field: "observability.metrics_addr".to_string(),
                reason: "Metrics server cannot share the API address".to_string(),
            });
        }

        Ok(())
    }

    /// Create a local development configuration.
    pub fn development() -> Self {
        Self {
            server: ServerConfig {
                bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
                error_policy: ErrorPolicy::Uniform,
                max_body_bytes: 64 * 1024,
                shutdown_timeout: Duration::from_secs(5),
            },
            model: ModelConfig::default(),
            observability: ObservabilityConfig {
                metrics_enabled: false,
                metrics_addr: SocketAddr::from(([127, 0, 0, 1], 9090)),
                log_level: "debug".to_string(),
                json_logs: false,
            },
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the prediction API.
    pub bind_addr: SocketAddr,
    /// Status code mapping for request failures.
    #[serde(default)]
    pub error_policy: ErrorPolicy,
    /// Maximum accepted request body size.
    pub max_body_bytes: usize,
    /// How long to wait for in-flight requests on shutdown.
    #[serde(with = "duration_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            error_policy: ErrorPolicy::Uniform,
            max_body_bytes: 64 * 1024, // 64KB
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Model artifact configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path to the serialized classifier.
    pub path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_MODEL_PATH),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable Prometheus metrics.
    pub metrics_enabled: bool,
    /// Metrics bind address.
    pub metrics_addr: SocketAddr,
    /// Log level.
    pub log_level: String,
    /// Enable JSON logging.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_addr: SocketAddr::from(([0, 0, 0, 0], 9090)),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Serde helper for durations written as `"<n><unit>"`.
///
/// Units are `ms`, `s`, `m` and `h`; a bare number is milliseconds.
pub mod duration_serde {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Unit suffixes and their length in milliseconds, smallest first.
    const UNITS: [(&str, u64); 4] = [("ms", 1), ("s", 1_000), ("m", 60_000), ("h", 3_600_000)];

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(*duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_duration(&text).map_err(D::Error::custom)
    }

    /// Renders with the largest unit that divides the duration exactly.
    pub(crate) fn format_duration(duration: Duration) -> String {
        let millis = duration.as_millis();
        if millis == 0 {
            return "0s".to_string();
        }
        let (unit, scale) = UNITS
            .iter()
            .rev()
            .find(|(_, scale)| millis % u128::from(*scale) == 0)
            .copied()
            .unwrap_or(UNITS[0]);
        format!("{}{}", millis / u128::from(scale), unit)
    }

    pub(crate) fn parse_duration(text: &str) -> Result<Duration, String> {
        let text = text.trim();
        let split = text
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(text.len());
        let (digits, unit) = text.split_at(split);

        let value: u64 = digits
            .parse()
            .map_err(|_| format!("invalid duration '{}'", text))?;
        let scale = match unit.trim() {
            "" => 1,
            unit => UNITS
                .iter()
                .find(|(name, _)| *name == unit)
                .map(|(_, scale)| *scale)
                .ok_or_else(|| format!("unknown duration unit '{}'", unit))?,
        };

        value
            .checked_mul(scale)
            .map(Duration::from_millis)
            .ok_or_else(|| format!("duration '{}' is too large", text))
    }
}
