//! Loan Predictor CLI - Main entry point.

use loan_predictor::cli::{Cli, Commands};
use loan_predictor::compute::predict_json;
use loan_predictor::config::PredictorConfig;
use std::path::PathBuf;
use tracing::error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    let mut config = match &cli.config {
        Some(path) => PredictorConfig::from_file(path)?,
        None => PredictorConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }

    loan_predictor::observability::init(&config.observability)?;

    match cli.command {
        Commands::Serve { bind, model } => {
            if let Some(bind) = bind {
                config.server.bind_addr = bind.parse()?;
            }
            override_model(&mut config, model);

            if let Err(e) = loan_predictor::run(config).await {
                error!("Loan predictor failed: {}", e);
                std::process::exit(1);
            }
        }

        Commands::CheckModel { model } => {
            override_model(&mut config, model);

            match loan_predictor::load_model(&config.model) {
                Ok(model) => {
                    println!("{}", serde_json::to_string_pretty(&model.summary())?);
                }
                Err(e) => {
                    eprintln!("Model check failed: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Predict { input, model } => {
            override_model(&mut config, model);

            let model = loan_predictor::load_model(&config.model)?;
            let body = std::fs::read(&input)?;

            match predict_json(model.as_ref(), &body) {
                Ok(response) => println!("{}", serde_json::to_string(&response)?),
                Err(e) => {
                    println!("{}", serde_json::json!({ "error": e.to_string() }));
                    std::process::exit(1);
                }
            }
        }

        Commands::Version => {
            println!("Loan Predictor v{}", env!("CARGO_PKG_VERSION"));
            println!("Serves a pre-trained loan default classifier over HTTP");
        }
    }

    Ok(())
}

/// Replace the configured model path when one was given on the command line.
fn override_model(config: &mut PredictorConfig, model: Option<PathBuf>) {
    if let Some(path) = model {
        config.model.path = path;
    }
}
