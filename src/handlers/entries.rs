use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::dto::{ChatRequest, ChatResponse, CreateEntryRequest, EntryListResponse, EntryQuery};
use crate::error::AppResult;
use crate::models::entry::DiaryEntry;
use crate::services::journal::EntryDraft;
use crate::state::Slice;
use crate::views::DateFilter;
use crate::AppState;

pub async fn list_entries(
    State(state): State<AppState>,
    Query(query): Query<EntryQuery>,
) -> Json<EntryListResponse> {
    let entries = state
        .journal
        .entries(DateFilter {
            start: query.start_date,
            end: query.end_date,
        })
        .await;

    Json(EntryListResponse {
        total: entries.len(),
        entries,
    })
}

pub async fn create_entry(
    State(state): State<AppState>,
    Json(body): Json<CreateEntryRequest>,
) -> AppResult<(StatusCode, Json<DiaryEntry>)> {
    body.validate()?;

    let entry = state
        .journal
        .post_entry(EntryDraft {
            content: body.content,
            mood: body.mood,
            privacy: body.privacy,
            image: body.image,
            voice: body.voice_data,
        })
        .await?;

    state.notify(Slice::Entries);
    state.notify(Slice::User);

    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DiaryEntry>> {
    Ok(Json(state.journal.entry(&id).await?))
}

pub async fn chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    body.validate()?;

    let turn = state.journal.chat(&id, body.fan_id, &body.message).await?;
    state.notify(Slice::Entries);

    Ok(Json(ChatResponse {
        thread: turn.thread,
        reply: turn.reply,
        messages: turn.messages,
    }))
}
