//! Error handling for the bookshelf HTTP layer
//!
//! Handlers return [`AppResult`]. Every failure reaching a client is either
//! a `404` carrying a human-readable message or a `500` carrying a static
//! message chosen by the handler; causes of internal failures are logged and
//! never serialized.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

pub type AppResult<T> = Result<T, AppError>;

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("not found: {message}")]
    NotFound {
        message: String,
        details: Map<String, Value>,
    },

    #[error("{message}")]
    Internal {
        message: &'static str,
        cause: anyhow::Error,
    },
}

impl AppError {
    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            details: Map::new(),
        }
    }

    /// Create an internal error with a static client-facing message
    pub fn internal(message: &'static str, cause: impl Into<anyhow::Error>) -> Self {
        Self::Internal {
            message,
            cause: cause.into(),
        }
    }

    /// Attach an extra top-level field to a not found body.
    /// Has no effect on internal errors.
    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        if let Self::NotFound { details, .. } = &mut self {
            details.insert(key.to_string(), value.into());
        }
        self
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Converts any failure into [`AppError::Internal`] with a fixed message.
pub trait OrInternal<T> {
    fn or_internal(self, message: &'static str) -> AppResult<T>;
}

impl<T, E> OrInternal<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn or_internal(self, message: &'static str) -> AppResult<T> {
        self.map_err(|cause| AppError::internal(message, cause))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            AppError::NotFound { message, details } => {
                tracing::debug!(status_code = %status.as_u16(), %message, "resource not found");

                let mut body = Map::with_capacity(details.len() + 1);
                body.insert("error".to_string(), Value::String(message));
                body.extend(details);
                body
            }
            AppError::Internal { message, cause } => {
                let error_id = Uuid::now_v7();
                tracing::error!(
                    error_id = %error_id,
                    status_code = %status.as_u16(),
                    cause = %format!("{cause:#}"),
                    "{message}"
                );

                let mut body = Map::with_capacity(1);
                body.insert("error".to_string(), Value::String(message.to_string()));
                body
            }
        };

        (status, Json(Value::Object(body))).into_response()
    }
}
