use axum::Json;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::BridgeError;

/// Canonical JSON payload for error responses.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiError {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

pub type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

/// Helper for controllers that need to return `(StatusCode, Json<ApiError>)`.
pub fn json_error(status: StatusCode, error: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (status, Json(ApiError::new(error)))
}

/// Status code a failed browse or relay call is reported with.
pub fn status_for(err: &BridgeError) -> StatusCode {
    match err {
        BridgeError::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        BridgeError::Upstream { .. } | BridgeError::Download(_) => StatusCode::BAD_GATEWAY,
        BridgeError::Staging { .. } | BridgeError::Ingestion(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Error body for browse endpoints: a single message.
pub fn browse_error(err: &BridgeError) -> (StatusCode, Json<ApiError>) {
    json_error(status_for(err), err.to_string())
}

/// Error body for the relay endpoint: a summary plus the underlying cause.
pub fn relay_error(err: &BridgeError) -> (StatusCode, Json<ApiError>) {
    let summary = match err {
        BridgeError::UpstreamUnavailable => "LMS integration is not configured",
        BridgeError::Upstream { .. } => "Failed to load file from the LMS",
        BridgeError::Download(_) => "Failed to download file from the LMS",
        BridgeError::Staging { .. } => "Failed to stage file for upload",
        BridgeError::Ingestion(_) => "Failed to upload file",
    };
    let body = ApiError::new(summary).with_details(err.to_string());
    (status_for(err), Json(body))
}
