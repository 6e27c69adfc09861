use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use catalog_core::DomainError;
use catalog_infra::StoreError;

/// Everything a handler can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Write request without `Content-Type: application/json`.
    #[error("{0}")]
    UnsupportedMediaType(String),

    /// Body was not parseable JSON.
    #[error("{0}")]
    MalformedBody(String),

    /// Query string did not fit the endpoint's parameters.
    #[error("{0}")]
    MalformedQuery(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Domain(e) => ApiError::Domain(e),
            other => ApiError::Store(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::UnsupportedMediaType(msg) => {
                json_error(StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_media_type", msg)
            }
            ApiError::MalformedBody(msg) | ApiError::MalformedQuery(msg) => {
                json_error(StatusCode::BAD_REQUEST, "bad_request", msg)
            }
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Store(err) => {
                tracing::error!("store failure: {err}");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", err.to_string())
            }
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "bad_request", msg),
        DomainError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        DomainError::InvariantViolation(msg) => {
            tracing::error!("contract violation: {msg}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "status": status.as_u16(),
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
