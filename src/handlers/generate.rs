use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::dto::{GenerateRequest, GenerateResponse, RelayErrorResponse};
use crate::services::relay::RelayError;
use crate::AppState;

fn relay_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(RelayErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// POST /api/generate: one prompt through the companion persona.
///
/// An unreadable body is treated like a missing `userInput`.
pub async fn generate(
    State(state): State<AppState>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Response {
    let input = match body {
        Ok(Json(req)) => req.user_input.unwrap_or_default(),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable relay request body");
            String::new()
        }
    };

    match state.journal.relay().generate(&input).await {
        Ok(text) => Json(GenerateResponse { text }).into_response(),
        Err(RelayError::MissingInput) => relay_error(StatusCode::BAD_REQUEST, "Missing userInput"),
        Err(RelayError::Vendor(_)) => {
            relay_error(StatusCode::INTERNAL_SERVER_ERROR, "AI failed")
        }
    }
}

pub async fn method_not_allowed() -> Response {
    relay_error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}
