use axum::{
    extract::{Query, State},
    Json,
};

use crate::dto::CalendarQuery;
use crate::error::AppResult;
use crate::views::{CalendarMonth, MoodDataPoint, Stats};
use crate::AppState;

pub async fn stats(State(state): State<AppState>) -> Json<Stats> {
    Json(state.journal.stats().await)
}

pub async fn mood_trend(State(state): State<AppState>) -> Json<Vec<MoodDataPoint>> {
    Json(state.journal.mood_trend().await)
}

pub async fn calendar(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> AppResult<Json<CalendarMonth>> {
    let month = state.journal.calendar(query.year, query.month).await?;
    Ok(Json(month))
}
