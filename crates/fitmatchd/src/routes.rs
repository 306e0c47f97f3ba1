//! API routes for fitmatchd

use crate::pipeline::predict_plan;
use crate::server::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use fitmatch_shared::wire::{ErrorResponse, HealthResponse, PredictRequest, PredictResponse, SchemaResponse};
use fitmatch_shared::FitmatchError;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, warn};

type AppStateArc = Arc<AppState>;

/// Client-visible failure of a request. Every variant answers
/// 400 with `{"detail": ...}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Body(String),

    #[error("{0}")]
    Pipeline(#[from] FitmatchError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Body(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            detail: self.to_string(),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

// ============================================================================
// Health Routes
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/health", get(health_check))
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

// ============================================================================
// Predict Routes
// ============================================================================

pub fn predict_routes() -> Router<AppStateArc> {
    Router::new().route("/predict", post(predict))
}

async fn predict(
    State(state): State<AppStateArc>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| {
        warn!("[PREDICT] Rejected body: {}", e.body_text());
        ApiError::from(e)
    })?;

    predict_plan(&state, &req).map(Json).map_err(|e| {
        error!("[PREDICT] user={} failed: {}", req.user_id, e);
        ApiError::from(e)
    })
}

// ============================================================================
// Schema Routes
// ============================================================================

pub fn schema_routes() -> Router<AppStateArc> {
    Router::new().route("/schema", get(schema))
}

async fn schema(State(state): State<AppStateArc>) -> Json<SchemaResponse> {
    Json(SchemaResponse {
        features: state.schema.names().to_vec(),
    })
}
