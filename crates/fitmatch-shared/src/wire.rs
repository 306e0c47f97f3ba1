//! HTTP request and response bodies.

use crate::features::InputFeatures;
use crate::plan::ScaledPlan;
use serde::{Deserialize, Serialize};

/// Body of `POST /predict`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    pub user_id: String,
    pub features: InputFeatures,
    /// Sent by the mobile client; does not change the plan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_index: Option<i64>,
    /// Sent by the mobile client; does not change the plan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_seed: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    #[serde(flatten)]
    pub plan: ScaledPlan,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaResponse {
    pub features: Vec<String>,
}

/// Failure body for any rejected request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}
