//! Error types for the loan prediction service.
//!
//! This module provides a unified error type [`PredictorError`] for every step of
//! the request path (parse, extract, compute, infer) and for start-up, along with
//! a convenient [`Result`] type alias.
//!
//! # Error Categories
//!
//! - **Request**: malformed bodies, missing or non-numeric fields, arithmetic
//!   failures while deriving features
//! - **Model**: artifact loading, format validation and inference
//! - **Configuration**: invalid settings
//! - **Runtime**: IO, serialization and network failures
//!
//! # Example
//!
//! ```rust
//! use loan_predictor::error::{ErrorPolicy, PredictorError};
//!
//! let err = PredictorError::DivisionByZero {
//!     feature: "income_to_loan_ratio",
//!     denominator: "loan_amount_requested",
//! };
//! assert!(err.is_client_error());
//! assert_eq!(err.status_code(ErrorPolicy::Uniform), 500);
//! assert_eq!(err.status_code(ErrorPolicy::Classified), 400);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use thiserror::Error;

/// Main error type for prediction service operations.
#[derive(Error, Debug)]
pub enum PredictorError {
    // Request errors
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid request fields: {}", join_issues(.0))]
    InvalidFields(Vec<FieldIssue>),

    #[error("Division by zero computing {feature}: {denominator} is zero")]
    DivisionByZero {
        feature: &'static str,
        denominator: &'static str,
    },

    #[error("Feature {0} is not a finite number")]
    NonFiniteFeature(&'static str),

    // Model errors
    #[error("Failed to load model from {path}: {reason}")]
    ModelLoad { path: String, reason: String },

    #[error("Invalid model artifact: {0}")]
    ModelFormat(String),

    #[error("Incompatible model artifact: {0}")]
    IncompatibleModel(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration: {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    // External errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// A single problem found while validating request fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldIssue {
    /// The field is absent or `null`.
    Missing(&'static str),
    /// The field is present but not a number.
    NotNumeric {
        field: &'static str,
        found: &'static str,
    },
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldIssue::Missing(field) => write!(f, "missing field '{}'", field),
            FieldIssue::NotNumeric { field, found } => {
                write!(f, "field '{}' must be a number, got {}", field, found)
            }
        }
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// How request-level errors map to HTTP status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Every request failure is a 500.
    #[default]
    Uniform,
    /// Caller mistakes are a 400, everything else a 500.
    Classified,
}

impl PredictorError {
    /// Whether the error was caused by the request contents rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PredictorError::BadRequest(_)
                | PredictorError::InvalidFields(_)
                | PredictorError::DivisionByZero { .. }
                | PredictorError::NonFiniteFeature(_)
        )
    }

    /// Convert to an HTTP status code under the given policy.
    pub fn status_code(&self, policy: ErrorPolicy) -> u16 {
        match policy {
            ErrorPolicy::Uniform => 500,
            ErrorPolicy::Classified if self.is_client_error() => 400,
            ErrorPolicy::Classified => 500,
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PredictorError::BadRequest(_) => "bad_request",
            PredictorError::InvalidFields(_) => "invalid_fields",
            PredictorError::DivisionByZero { .. } => "division_by_zero",
            PredictorError::NonFiniteFeature(_) => "non_finite_feature",
            PredictorError::ModelLoad { .. }
            | PredictorError::ModelFormat(_)
            | PredictorError::IncompatibleModel(_) => "model",
            PredictorError::Inference(_) => "inference",
            PredictorError::Config(_) | PredictorError::InvalidConfig { .. } => "config",
            PredictorError::Io(_) => "io",
            PredictorError::Serialization(_) => "serialization",
            PredictorError::Network(_) => "network",
            PredictorError::Internal(_) => "internal",
        }
    }
}

impl From<serde_json::Error> for PredictorError {
    fn from(e: serde_json::Error) -> Self {
        PredictorError::Serialization(e.to_string())
    }
}

/// Result type alias for prediction service operations.
pub type Result<T> = std::result::Result<T, PredictorError>;
