//! Command-line interface for the prediction service.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Loan default prediction service.
#[derive(Parser)]
#[command(name = "loan-predictor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "LOAN_PREDICTOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "LOAN_PREDICTOR_LOG_LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Start the prediction server
    Serve {
        /// Bind address for the HTTP API
        #[arg(long, env = "LOAN_PREDICTOR_BIND")]
        bind: Option<String>,

        /// Path to the classifier artifact
        #[arg(short, long, env = "LOAN_PREDICTOR_MODEL")]
        model: Option<PathBuf>,
    },

    /// Load and validate a classifier artifact
    CheckModel {
        /// Path to the classifier artifact
        #[arg(short, long, env = "LOAN_PREDICTOR_MODEL")]
        model: Option<PathBuf>,
    },

    /// Run a single prediction from a JSON request file
    Predict {
        /// Request body file
        #[arg(short, long)]
        input: PathBuf,

        /// Path to the classifier artifact
        #[arg(short, long, env = "LOAN_PREDICTOR_MODEL")]
        model: Option<PathBuf>,
    },

    /// Show version information
    Version,
}
