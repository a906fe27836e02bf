use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::dto::{CreateFanRequest, DeleteResponse, FanListResponse, UpdateFanRequest};
use crate::error::AppResult;
use crate::models::fan::{AiFan, FanDraft, FAN_COST, MAX_FANS};
use crate::services::fans::FanUpdate;
use crate::state::Slice;
use crate::AppState;

pub async fn list_fans(State(state): State<AppState>) -> Json<FanListResponse> {
    Json(FanListResponse {
        fans: state.journal.fans().await,
        max_fans: MAX_FANS,
        fan_cost: FAN_COST,
    })
}

pub async fn create_fan(
    State(state): State<AppState>,
    Json(body): Json<CreateFanRequest>,
) -> AppResult<(StatusCode, Json<AiFan>)> {
    body.validate()?;

    let fan = state
        .journal
        .add_fan(FanDraft {
            name: body.name,
            avatar: body.avatar,
            style: body.style,
        })
        .await?;

    state.notify(Slice::Fans);
    state.notify(Slice::User);

    Ok((StatusCode::CREATED, Json(fan)))
}

pub async fn update_fan(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateFanRequest>,
) -> AppResult<Json<AiFan>> {
    body.validate()?;

    let fan = state
        .journal
        .update_fan(
            &id,
            FanUpdate {
                name: body.name,
                avatar: body.avatar,
                style: body.style,
                is_active: body.is_active,
            },
        )
        .await?;
    state.notify(Slice::Fans);

    Ok(Json(fan))
}

pub async fn delete_fan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DeleteResponse>> {
    state.journal.delete_fan(&id).await?;
    state.notify(Slice::Fans);

    Ok(Json(DeleteResponse { deleted: true, id }))
}
