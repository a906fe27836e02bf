use axum::{extract::State, Json};
use validator::Validate;

use crate::dto::{
    OnboardingRequest, PreferencesRequest, PreferencesResponse, ProfileResponse,
    UpdateProfileRequest,
};
use crate::error::AppResult;
use crate::models::user::UserConfig;
use crate::state::Slice;
use crate::AppState;

/// Wraps `user` with the tier rules and onboarding flag.
pub(crate) async fn profile_response(state: &AppState, user: UserConfig) -> ProfileResponse {
    let onboarding_completed = state.journal.read(|d| d.onboarding_completed).await;
    ProfileResponse::new(user, onboarding_completed)
}

pub async fn me(State(state): State<AppState>) -> Json<ProfileResponse> {
    let profile = state
        .journal
        .read(|d| ProfileResponse::new(d.user.clone(), d.onboarding_completed))
        .await;
    Json(profile)
}

pub async fn update_me(
    State(state): State<AppState>,
    Json(body): Json<UpdateProfileRequest>,
) -> AppResult<Json<ProfileResponse>> {
    body.validate()?;

    let user = state.journal.update_profile(body.name, body.avatar).await?;
    state.notify(Slice::User);

    Ok(Json(profile_response(&state, user).await))
}

pub async fn complete_onboarding(
    State(state): State<AppState>,
    Json(body): Json<OnboardingRequest>,
) -> AppResult<Json<ProfileResponse>> {
    body.validate()?;

    let user = state
        .journal
        .complete_onboarding(body.name, body.avatar)
        .await?;
    state.notify(Slice::User);
    state.notify(Slice::Onboarding);

    Ok(Json(ProfileResponse::new(user, true)))
}

pub async fn get_preferences(State(state): State<AppState>) -> Json<PreferencesResponse> {
    let prefs = state.journal.preferences().await;
    Json(PreferencesResponse {
        theme: prefs.theme,
        language: prefs.language,
    })
}

pub async fn update_preferences(
    State(state): State<AppState>,
    Json(body): Json<PreferencesRequest>,
) -> Json<PreferencesResponse> {
    let prefs = state
        .journal
        .set_preferences(body.theme, body.language)
        .await;

    if body.theme.is_some() {
        state.notify(Slice::Theme);
    }
    if body.language.is_some() {
        state.notify(Slice::Language);
    }

    Json(PreferencesResponse {
        theme: prefs.theme,
        language: prefs.language,
    })
}
