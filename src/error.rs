//! Unified error taxonomy (spec §7): Validation, NotFound, ResourceError,
//! DriverError, ProtocolError. One `thiserror` enum, one `IntoResponse`
//! impl, rather than Flask's per-exception-type handler registry.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

use crate::disks::DiskServiceError;
use crate::registry::RegistryError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("resource error: {0}")]
    Resource(String),

    #[error("driver error: {0}")]
    Driver(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<RegistryError> for AppError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::NotFound(key) => AppError::NotFound(format!("registry key {key}")),
            other => AppError::Resource(other.to_string()),
        }
    }
}

impl From<DiskServiceError> for AppError {
    fn from(e: DiskServiceError) -> Self {
        AppError::Resource(e.to_string())
    }
}

impl AppError {
    fn status_and_label(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation error"),
            // spec's 400/404 split reserves 404 for unmatched routes (axum's own
            // fallback handles that); a missing entity is a 400 unknown-key.
            AppError::NotFound(_) => (StatusCode::BAD_REQUEST, "unknown id"),
            AppError::Resource(_) => (StatusCode::BAD_REQUEST, "resource error"),
            AppError::Driver(_) => (StatusCode::INTERNAL_SERVER_ERROR, "driver error"),
            AppError::Protocol(_) => (StatusCode::BAD_REQUEST, "protocol error"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal server error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, label) = self.status_and_label();
        let body = json!({
            "status": status.as_u16(),
            "error": label,
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
