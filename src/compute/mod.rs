//! Loan default classification.
//!
//! - Feature engineering from raw applicant attributes
//! - Gradient boosted classifier artifact loading and inference
//! - HTTP serving of single-sample predictions

pub mod features;
pub mod model;
pub mod serving;

pub use features::{FeatureVector, LoanApplication, FEATURE_COUNT, FEATURE_NAMES};
pub use model::{Classifier, GradientBoostingClassifier, ModelSummary, RegressionTree};
pub use serving::{predict_json, router, AppState, PredictResponse, PredictionServer};
