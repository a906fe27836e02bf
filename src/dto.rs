//! # MoodLog: Request/Response DTOs
//!
//! All API contract types in one module.
//!
//! Conventions:
//! - `*Request`  → deserialized from client JSON body or query params
//! - `*Response` → serialized to client JSON
//! - JSON bodies use camelCase, matching the stored records they carry
//! - All validation is expressed via `validator` derive macros

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::models::entry::{ChatMessage, DiaryEntry, Privacy};
use crate::models::fan::{AiFan, AiStyle};
use crate::models::insight::{InsightData, InsightPeriod};
use crate::models::locale::{Language, ThemeColor};
use crate::models::mood::Mood;
use crate::models::user::{SubscriptionTier, TierRules, UserConfig};

// ============================================================================
// Common
// ============================================================================

/// Standard delete confirmation
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub id: String,
}

/// Stable error envelope: every error response uses this shape
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Treats `?start_date=` the same as an absent parameter.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

// ============================================================================
// AI relay
// ============================================================================

/// POST /api/generate
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub user_input: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub text: String,
}

/// The relay keeps its own flat error shape.
#[derive(Debug, Serialize)]
pub struct RelayErrorResponse {
    pub error: String,
}

// ============================================================================
// Profile & preferences
// ============================================================================

/// GET /api/me
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: UserConfig,
    pub rules: TierRules,
    pub can_post: bool,
    pub can_use_flow: bool,
    pub onboarding_completed: bool,
}

impl ProfileResponse {
    pub fn new(user: UserConfig, onboarding_completed: bool) -> Self {
        Self {
            rules: user.rules(),
            can_post: user.check_post_limit().is_ok(),
            can_use_flow: user.can_use_flow(),
            onboarding_completed,
            user,
        }
    }
}

/// PUT /api/me: partial update
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 50, message = "Name must be under 50 characters"))]
    pub name: Option<String>,

    /// An emoji or an image data URL
    pub avatar: Option<String>,
}

/// POST /api/onboarding
#[derive(Debug, Deserialize, Validate)]
pub struct OnboardingRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: String,

    pub avatar: Option<String>,
}

/// GET/PUT /api/preferences
#[derive(Debug, Deserialize)]
pub struct PreferencesRequest {
    pub theme: Option<ThemeColor>,
    pub language: Option<Language>,
}

#[derive(Debug, Serialize)]
pub struct PreferencesResponse {
    pub theme: ThemeColor,
    pub language: Language,
}

// ============================================================================
// Entries
// ============================================================================

/// GET /api/entries?start_date=YYYY-MM-DD&end_date=YYYY-MM-DD
#[derive(Debug, Default, Deserialize)]
pub struct EntryQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub end_date: Option<NaiveDate>,
}

/// POST /api/entries
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryRequest {
    #[serde(default)]
    #[validate(length(max = 5000, message = "Content must be under 5000 characters"))]
    pub content: String,

    #[serde(default)]
    pub mood: Mood,

    #[serde(default)]
    pub privacy: Privacy,

    /// Image data URL; downscaled before storing
    pub image: Option<String>,

    /// Audio data URL
    pub voice_data: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EntryListResponse {
    pub entries: Vec<DiaryEntry>,
    pub total: usize,
}

/// POST /api/entries/{id}/chat
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[validate(length(min = 1, max = 2000, message = "Message must be 1-2000 characters"))]
    pub message: String,

    /// Companion to talk to; the primary companion when absent
    pub fan_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub thread: String,
    pub reply: String,
    pub messages: Vec<ChatMessage>,
}

// ============================================================================
// Views
// ============================================================================

/// GET /api/calendar?year=2024&month=6
#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

/// GET /api/insights?period=weekly|monthly
#[derive(Debug, Deserialize)]
pub struct InsightQuery {
    #[serde(default)]
    pub period: InsightPeriod,
}

#[derive(Debug, Serialize)]
pub struct InsightResponse {
    pub loading: bool,
    #[serde(flatten)]
    pub data: InsightData,
}

// ============================================================================
// Companions
// ============================================================================

/// POST /api/fans
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFanRequest {
    #[validate(length(min = 1, max = 30, message = "Name must be 1-30 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 16))]
    pub avatar: String,

    #[serde(default)]
    pub style: AiStyle,
}

/// PUT /api/fans/{id}: partial update
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFanRequest {
    #[validate(length(min = 1, max = 30))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 16))]
    pub avatar: Option<String>,

    pub style: Option<AiStyle>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FanListResponse {
    pub fans: Vec<AiFan>,
    pub max_fans: usize,
    pub fan_cost: u32,
}

// ============================================================================
// Billing
// ============================================================================

/// POST /api/billing/tier
#[derive(Debug, Deserialize)]
pub struct SelectTierRequest {
    pub tier: SubscriptionTier,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierChangeResponse {
    pub changed: bool,
    pub cost: u32,
    pub profile: ProfileResponse,
}

/// POST /api/billing/recharge
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RechargeRequest {
    pub wallet_address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RechargeResponse {
    pub credited: u32,
    pub profile: ProfileResponse,
}

// ============================================================================
// Decision helper
// ============================================================================

/// POST /api/decision
#[derive(Debug, Deserialize, Validate)]
pub struct DecisionRequest {
    #[validate(length(min = 1, max = 2000, message = "Question must be 1-2000 characters"))]
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    pub answer: String,
}
