//! Domain error type shared by the state layer and HTTP handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GameError {
    /// Request was well-formed but violates a game rule (422)
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    /// Malformed request input, e.g. an unparseable cursor (400)
    #[error("{0}")]
    BadRequest(String),
    #[error("Not authenticated.")]
    Unauthorized,
}

impl GameError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GameError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GameError::NotFound(_) => StatusCode::NOT_FOUND,
            GameError::Conflict(_) => StatusCode::CONFLICT,
            GameError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GameError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for GameError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
