use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::dto::{ErrorBody, ErrorResponse};
use crate::media::MediaError;
use crate::models::locale::{Language, Text};
use crate::models::user::{Denied, LimitKind};
use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A business rule refused the action; `lang` localizes the message.
    #[error("{reason}")]
    Denied { reason: Denied, lang: Language },

    #[error("Rate limited")]
    RateLimited,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn denied(reason: Denied, lang: Language) -> Self {
        Self::Denied { reason, lang }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl From<MediaError> for AppError {
    fn from(e: MediaError) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            AppError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                msg.clone(),
                None,
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            AppError::Denied { reason, lang } => match reason {
                Denied::InsufficientPoints { required, balance } => (
                    StatusCode::PAYMENT_REQUIRED,
                    "insufficient_points",
                    self.to_string(),
                    Some(json!({ "required": required, "balance": balance })),
                ),
                Denied::FanLimit { max } => (
                    StatusCode::CONFLICT,
                    "fan_limit_reached",
                    self.to_string(),
                    Some(json!({ "max": max })),
                ),
                Denied::DailyLimit(kind) => {
                    let text = match kind {
                        LimitKind::Post => Text::LimitReachedPost,
                        LimitKind::Flow => Text::LimitReachedFlow,
                    };
                    (
                        StatusCode::FORBIDDEN,
                        "limit_reached",
                        lang.text(text).to_string(),
                        Some(json!({ "limit": kind })),
                    )
                }
            },
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                self.to_string(),
                None,
            ),
            AppError::Storage(e) => {
                tracing::error!(error = %e, "Storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".into(),
                    None,
                )
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".into(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                status: status.as_u16(),
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
