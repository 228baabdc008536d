/// HTTP error mapping
///
/// Every handler returns `Result<_, ApiError>`; errors become a status code and
/// a `{"error": "<message>"}` body.

use crate::error::{CompileError, StoreError};
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::WorkflowNotFound(_) | StoreError::NodeNotFound { .. }) => {
                StatusCode::NOT_FOUND
            }
            Self::Store(StoreError::MissingFields(_) | StoreError::InvalidProperties { .. }) => {
                StatusCode::BAD_REQUEST
            }
            Self::Compile(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::warn!("❌ Request failed with {}: {}", status, self);
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
