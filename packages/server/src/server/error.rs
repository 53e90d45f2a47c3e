//! HTTP error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::domains::rotation::RotationError;
use crate::domains::squares::{PurchaseError, StoreError};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Server misconfigured: {0}")]
    Configuration(String),

    #[error("Admin credential required")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Configuration(_) | ApiError::Unavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound(err.to_string()),
            StoreError::OutOfRange(_) => ApiError::BadRequest(err.to_string()),
            StoreError::SquareOccupied(_)
            | StoreError::NotPending(_)
            | StoreError::OccupancyChanged { .. } => ApiError::Conflict(err.to_string()),
            StoreError::Database(_) => ApiError::Unavailable(err.to_string()),
            StoreError::Internal(e) => ApiError::Internal(e),
        }
    }
}

impl From<PurchaseError> for ApiError {
    fn from(err: PurchaseError) -> Self {
        match err {
            PurchaseError::InvalidSquare(_)
            | PurchaseError::InvalidDuration
            | PurchaseError::AlreadyExpired(_) => {
                ApiError::BadRequest(err.to_string())
            }
            PurchaseError::Store(e) => e.into(),
        }
    }
}

impl From<RotationError> for ApiError {
    fn from(err: RotationError) -> Self {
        match err {
            RotationError::Store(e) => e.into(),
            RotationError::Task(e) => ApiError::Internal(anyhow::anyhow!(e)),
        }
    }
}
