//! Configuration management for fitmatchd.
//!
//! Loads settings from /etc/fitmatch/config.toml or uses defaults.
//! `MODEL_PATH` and `SCHEMA_PATH` in the environment override the file, and
//! command line flags override both.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/fitmatch/config.toml";

/// Default config file path for fallback
pub const DEFAULT_CONFIG_PATH: &str = "/var/lib/fitmatch/config.toml";

pub const MODEL_PATH_ENV: &str = "MODEL_PATH";
pub const SCHEMA_PATH_ENV: &str = "SCHEMA_PATH";

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

/// Scoring model and feature schema locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    #[serde(default = "default_schema_path")]
    pub schema_path: PathBuf,
}

fn default_model_path() -> PathBuf {
    PathBuf::from("pipeline.json")
}

fn default_schema_path() -> PathBuf {
    PathBuf::from("feature_schema.json")
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            schema_path: default_schema_path(),
        }
    }
}

/// Plan template source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanConfig {
    /// JSON template replacing the built-in one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_path: Option<PathBuf>,
}

/// Full daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub plan: PlanConfig,
}

impl Config {
    /// Load config from file, or return defaults
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_PATH)
            .or_else(|_| Self::load_from_path(DEFAULT_CONFIG_PATH))
            .unwrap_or_else(|e| {
                warn!("Config not found, using defaults: {}", e);
                Config::default()
            })
    }

    /// Load config from specific path
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply `MODEL_PATH` / `SCHEMA_PATH` from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply path overrides from an environment lookup
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(MODEL_PATH_ENV).filter(|p| !p.is_empty()) {
            self.model.model_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(SCHEMA_PATH_ENV).filter(|p| !p.is_empty()) {
            self.model.schema_path = PathBuf::from(path);
        }
    }
}
