use crate::error::ApiError;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use pipeconf_backend::{Dispatcher, TlsMode};
use pipeconf_core::{build_response, EventContext, PipeconfError};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub started_at: DateTime<Utc>,
    pub debug: bool,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, debug: bool) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            started_at: Utc::now(),
            debug,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/health", get(health_check))
        .route("/ciconfig", post(handle_config_request))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

/// Service status and effective configuration, token excluded
async fn status(State(state): State<AppState>) -> Json<Value> {
    let config = state.dispatcher.config();
    Json(json!({
        "status": "running",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "started_at": state.started_at.to_rfc3339(),
        "config": {
            "server_type": config.backend_type,
            "namespace_tmpl": config.templates.namespace,
            "reponame_tmpl": config.templates.repository,
            "branch_tmpl": config.templates.branch,
            "path_tmpl": config.templates.path,
            "tls_skip_verify": config.tls == TlsMode::SkipVerify,
            "debug": state.debug,
        }
    }))
}

async fn handle_config_request(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let span = info_span!("ciconfig", request_id = %Uuid::new_v4());

    async move {
        let event: EventContext =
            serde_json::from_slice(&body).map_err(|e| PipeconfError::InvalidRequest(e.to_string()))?;

        info!(
            repo = %event.repo.full_name,
            branch = %event.pipeline.branch,
            "Received config request"
        );

        let records = state.dispatcher.resolve_files(&event).await?;
        let bundle = build_response(records);

        if bundle.is_empty() {
            info!("No config files found, keeping the repository's own config");
            return Ok(StatusCode::NO_CONTENT.into_response());
        }

        info!(count = bundle.len(), "Returning config override");
        Ok(Json(bundle).into_response())
    }
    .instrument(span)
    .await
}
