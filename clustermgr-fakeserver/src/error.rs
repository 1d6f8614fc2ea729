//! Error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use clustermgr_api::{ApiError, SchemaError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FakeServerError {
    #[error("service not found: {0}")]
    NotFound(String),

    /// Malformed bodies are answered with a server error, as the real API does.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("missing or invalid bearer token")]
    Unauthorized,
}

impl FakeServerError {
    fn status(&self) -> StatusCode {
        match self {
            FakeServerError::NotFound(_) => StatusCode::NOT_FOUND,
            FakeServerError::Schema(_) => StatusCode::INTERNAL_SERVER_ERROR,
            FakeServerError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for FakeServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ApiError {
            error: self.to_string(),
            code: status.as_u16() as u32,
        };
        (status, Json(body)).into_response()
    }
}
