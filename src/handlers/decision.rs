use axum::{extract::State, Json};
use validator::Validate;

use crate::dto::{DecisionRequest, DecisionResponse};
use crate::error::AppResult;
use crate::state::Slice;
use crate::AppState;

pub async fn decide(
    State(state): State<AppState>,
    Json(body): Json<DecisionRequest>,
) -> AppResult<Json<DecisionResponse>> {
    body.validate()?;

    let answer = state.journal.decide(&body.question).await?;
    state.notify(Slice::User);

    Ok(Json(DecisionResponse { answer }))
}
