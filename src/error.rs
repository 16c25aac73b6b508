use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::types::{CategoryId, GameId, QuestionId};

/// Result type for data-store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for board engine operations
pub type BoardResult<T> = Result<T, BoardError>;

/// Errors raised by the question pool or game ledger
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Question {0} not found")]
    QuestionNotFound(QuestionId),

    #[error("Category {0} not found")]
    CategoryNotFound(CategoryId),

    #[error("Game {0} not found")]
    GameNotFound(GameId),

    #[error("Duplicate id {0}")]
    Duplicate(i64),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by the cache store. Callers treat every one of these as a miss.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by the board engine and the HTTP layer
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("Game {0} not found")]
    GameNotFound(GameId),

    #[error("Category {0} not found")]
    CategoryNotFound(CategoryId),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for BoardError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::GameNotFound(_) | Self::CategoryNotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::GameNotFound(_))
            | Self::Store(StoreError::CategoryNotFound(_))
            | Self::Store(StoreError::QuestionNotFound(_)) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::Store(StoreError::Duplicate(_)) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
