use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Missing {0} stream data")]
    MissingStreamData(&'static str),
    #[error("Activity {0} was deleted")]
    ActivityRemoved(u64),
}

#[derive(Debug, thiserror::Error)]
pub enum QualityError {
    #[error("Not enough points (need at least 2, got {0}). Ingest streams first.")]
    InsufficientPoints(usize),
    #[error("Activity {0} was deleted")]
    ActivityRemoved(u64),
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Stream source request failed: {0}")]
    Request(String),
    #[error("Stream source returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Invalid stream source response: {0}")]
    Decode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Quality(#[from] QualityError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("{0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Ingest(IngestError::ActivityRemoved(_)) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            AppError::Ingest(_) | AppError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            AppError::Quality(_) | AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Fetch(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
