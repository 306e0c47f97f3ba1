//! Error types for FitMatch.

use thiserror::Error;

/// Failures raised while scoring a normalized row.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("feature '{feature}' has value '{value}' the model cannot encode")]
    Unencodable { feature: String, value: String },

    #[error("model expects feature '{0}' but the row does not carry it")]
    MissingFeature(String),

    #[error("tree {tree} is malformed at node {node}")]
    MalformedTree { tree: usize, node: usize },

    #[error("model produced a non-finite score")]
    NonFinite,
}

#[derive(Error, Debug)]
pub enum FitmatchError {
    #[error("Model error: {0}")]
    Model(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Inference error: {0}")]
    Inference(#[from] ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FitmatchError>;
