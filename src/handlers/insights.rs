use axum::{
    extract::{Query, State},
    Json,
};

use crate::dto::{InsightQuery, InsightResponse};
use crate::AppState;

/// GET /api/insights: regenerates when the journal changed since the last
/// analysis; otherwise answers from the cached result.
pub async fn get_insights(
    State(state): State<AppState>,
    Query(query): Query<InsightQuery>,
) -> Json<InsightResponse> {
    let view = state.journal.insights(query.period).await;
    Json(InsightResponse {
        loading: view.loading,
        data: view.data,
    })
}
