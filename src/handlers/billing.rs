use axum::{extract::State, Json};

use crate::dto::{RechargeRequest, RechargeResponse, SelectTierRequest, TierChangeResponse};
use crate::error::AppResult;
use crate::handlers::profile::profile_response;
use crate::models::user::{TierChange, TierRules};
use crate::services::billing::{self, RECHARGE_POINTS};
use crate::state::Slice;
use crate::AppState;

pub async fn list_tiers() -> Json<Vec<TierRules>> {
    Json(billing::tiers())
}

pub async fn select_tier(
    State(state): State<AppState>,
    Json(body): Json<SelectTierRequest>,
) -> AppResult<Json<TierChangeResponse>> {
    let (change, user) = state.journal.select_tier(body.tier).await?;

    let (changed, cost) = match change {
        TierChange::Unchanged => (false, 0),
        TierChange::Switched { cost } => {
            state.notify(Slice::User);
            (true, cost)
        }
    };

    Ok(Json(TierChangeResponse {
        changed,
        cost,
        profile: profile_response(&state, user).await,
    }))
}

/// Simulated payment: always credits, optionally links a wallet.
pub async fn recharge(
    State(state): State<AppState>,
    body: Option<Json<RechargeRequest>>,
) -> Json<RechargeResponse> {
    let body = body.map(|Json(b)| b).unwrap_or_default();

    let user = state.journal.recharge(body.wallet_address).await;
    state.notify(Slice::User);

    Json(RechargeResponse {
        credited: RECHARGE_POINTS,
        profile: profile_response(&state, user).await,
    })
}
