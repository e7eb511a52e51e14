use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use burrow_core::CoreError;
use burrow_resolver::ServiceError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    InvalidShortCode(#[from] CoreError),
    #[error("malformed request body: {0}")]
    MalformedBody(#[from] JsonRejection),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Service(ServiceError::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            AppError::Service(ServiceError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Service(
                ServiceError::StoreUnavailable(_)
                | ServiceError::IdSpaceExhausted { .. }
                | ServiceError::AdmissionCancelled,
            ) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidShortCode(_) | AppError::MalformedBody(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self, "Request failed");
            "internal server error".to_string()
        } else {
            warn!(status = %status, error = %self, "Request rejected");
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
