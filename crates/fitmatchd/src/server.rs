//! HTTP server for fitmatchd

use crate::config::Config;
use crate::routes;
use anyhow::{Context, Result};
use axum::Router;
use fitmatch_shared::{FeatureSchema, ModelFile, PlanTemplate, ScoringModel, BUILTIN_TEMPLATE};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers. Nothing in it is written after
/// startup.
pub struct AppState {
    pub model: Arc<dyn ScoringModel>,
    pub schema: Arc<FeatureSchema>,
    pub template: Arc<PlanTemplate>,
}

impl AppState {
    pub fn new(model: Arc<dyn ScoringModel>, schema: FeatureSchema, template: PlanTemplate) -> Self {
        Self {
            model,
            schema: Arc::new(schema),
            template: Arc::new(template),
        }
    }

    /// Load model, schema and template named by `config`. Any failure here
    /// is fatal to startup.
    pub fn from_config(config: &Config) -> Result<Self> {
        let model_path = &config.model.model_path;
        let model = ModelFile::load(model_path)
            .with_context(|| format!("Failed to load model at {}", model_path.display()))?;

        let schema_path = &config.model.schema_path;
        let schema = FeatureSchema::load(schema_path)
            .with_context(|| format!("Failed to load schema at {}", schema_path.display()))?;

        let template = match &config.plan.template_path {
            Some(path) => PlanTemplate::load(path)
                .with_context(|| format!("Failed to load plan template at {}", path.display()))?,
            None => BUILTIN_TEMPLATE.clone(),
        };

        info!(
            "[BOOT] Model {} ready, {} features, template '{}'",
            model.version().unwrap_or("(unversioned)"),
            schema.len(),
            template.id
        );

        Ok(Self::new(Arc::new(model), schema, template))
    }
}

/// Build the router over shared state
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::health_routes())
        .merge(routes::predict_routes())
        .merge(routes::schema_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until ctrl-c
pub async fn run(state: AppState, bind: &str) -> Result<()> {
    let app = router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("[BOOT] Listening on http://{}", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Shutting down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl-c: {}", e);
    }
}
