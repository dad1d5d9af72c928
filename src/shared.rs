use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

use crate::config::ChatConfig;
use crate::message::repository::MessageRepository;
use crate::participant::repository::ParticipantRepository;

/// Header carrying the caller's free-text identity
pub const USER_HEADER: &str = "user";

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub participant_repository: Arc<dyn ParticipantRepository + Send + Sync>,
    pub message_repository: Arc<dyn MessageRepository + Send + Sync>,
    pub chat_config: ChatConfig,
}

impl AppState {
    pub fn new(
        participant_repository: Arc<dyn ParticipantRepository + Send + Sync>,
        message_repository: Arc<dyn MessageRepository + Send + Sync>,
        chat_config: ChatConfig,
    ) -> Self {
        Self {
            participant_repository,
            message_repository,
            chat_config,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl AppError {
    /// Validation error with a single message
    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::Validation(vec![message.into()])
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection.body_text(), "Rejected request body");
        AppError::invalid(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        warn!(error = %rejection.body_text(), "Rejected query string");
        AppError::invalid(rejection.body_text())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(details) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "error": details.join("; "),
                    "details": details,
                }),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": format!("Database error: {}", msg) }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Extracts the caller identity from the `user` header.
/// Missing, empty or non-UTF-8 values are all treated as anonymous.
pub fn identity_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_HEADER)
        .and_then(|value| std::str::from_utf8(value.as_bytes()).ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
