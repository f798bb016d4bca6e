//! Common test utilities for integration tests.

pub mod fixtures;

use loan_predictor::compute::GradientBoostingClassifier;
use std::path::PathBuf;
use tempfile::TempDir;

// Re-export common types
pub use fixtures::*;

/// Test environment that manages a temporary model directory.
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub model_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let model_dir = temp_dir.path().join("models");
        std::fs::create_dir_all(&model_dir).expect("Failed to create model dir");

        Self { temp_dir, model_dir }
    }

    /// Serializes a model into the temp dir and returns its path.
    pub fn write_model(&self, name: &str, model: &GradientBoostingClassifier) -> PathBuf {
        let bytes = serde_json::to_vec_pretty(model).expect("Failed to serialize model");
        self.write_raw(name, &bytes)
    }

    /// Writes arbitrary bytes into the temp dir.
    pub fn write_raw(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.model_dir.join(name);
        std::fs::write(&path, bytes).expect("Failed to write test file");
        path
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Path of the artifact shipped with the repository.
pub fn bundled_model_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(loan_predictor::config::DEFAULT_MODEL_PATH)
}
