use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pipeconf_core::PipeconfError;
use serde::Serialize;
use tracing::{error, info, warn};

/// Wraps a pipeline error for the HTTP layer
#[derive(Debug)]
pub struct ApiError(pub PipeconfError);

impl From<PipeconfError> for ApiError {
    fn from(err: PipeconfError) -> Self {
        ApiError(err)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self.0 {
            // The override directory is missing or unreadable: let the
            // orchestrator fall back to the repository's own config.
            PipeconfError::Fetch(err) => {
                info!(error = %err, "No config override available");
                return StatusCode::NO_CONTENT.into_response();
            }
            PipeconfError::Template(_) | PipeconfError::InvalidRequest(_) => {
                warn!(error = %self.0, "Rejecting config request");
                (StatusCode::BAD_REQUEST, "Bad Request")
            }
            PipeconfError::UnsupportedBackend(_) | PipeconfError::InvalidConfiguration(_) => {
                error!(error = %self.0, "Service misconfigured");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            message: self.0.to_string(),
        });

        (status, body).into_response()
    }
}
