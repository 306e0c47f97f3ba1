//! FitMatch Daemon - workout plan inference service
//!
//! Scores client features with a pre-trained model and returns a plan
//! scaled to the score.

use anyhow::Result;
use clap::Parser;
use fitmatchd::config::Config;
use fitmatchd::server::{self, AppState};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "fitmatchd")]
#[command(about = "FitMatch plan inference daemon", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to /etc/fitmatch/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:8000
    #[arg(long)]
    bind: Option<String>,

    /// Model file, overrides MODEL_PATH
    #[arg(long)]
    model: Option<PathBuf>,

    /// Feature schema file, overrides SCHEMA_PATH
    #[arg(long)]
    schema: Option<PathBuf>,
}

impl Cli {
    fn resolve_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from_path(path)?,
            None => Config::load(),
        };
        config.apply_env();
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(model) = &self.model {
            config.model.model_path = model.clone();
        }
        if let Some(schema) = &self.schema {
            config.model.schema_path = schema.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("[BOOT] FitMatch Daemon v{} starting...", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    let state = match AppState::from_config(&config) {
        Ok(state) => state,
        Err(e) => {
            error!("[FATAL] {:#}", e);
            return Err(e);
        }
    };

    server::run(state, &config.server.bind).await
}
