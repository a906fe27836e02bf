use async_trait::async_trait;
use axum::{
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

use moodlog_api::clock::Clock;
use moodlog_api::config::{Config, MediaLimits};
use moodlog_api::services::relay::{CompletionClient, Relay};
use moodlog_api::services::Journal;
use moodlog_api::storage::MemoryStore;
use moodlog_api::{router, AppState};

/// Answers every prompt with the same text, or fails when it has none.
struct ScriptedVendor {
    reply: Option<String>,
    calls: AtomicUsize,
}

#[async_trait]
impl CompletionClient for ScriptedVendor {
    async fn complete(&self, _system: &str, _user: &str) -> anyhow::Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Some(text) => Ok(Some(text.clone())),
            None => anyhow::bail!("AI vendor error 502 Bad Gateway"),
        }
    }
}

async fn app_with(reply: Option<&str>) -> (Router, Arc<ScriptedVendor>) {
    let vendor = Arc::new(ScriptedVendor {
        reply: reply.map(str::to_string),
        calls: AtomicUsize::new(0),
    });
    let journal = Journal::open(
        Arc::new(MemoryStore::new()),
        Relay::new(vendor.clone()),
        Clock::default(),
        MediaLimits::default(),
    )
    .await;
    let state = AppState::new(Config::default(), journal);
    let app = router(state).layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));
    (app, vendor)
}

async fn app() -> Router {
    app_with(Some("抱抱你，今天辛苦了。")).await.0
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, Method::GET, "/readyz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["storage"], "ok");
}

#[tokio::test]
async fn test_generate_contract() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/generate",
        Some(json!({ "userInput": "今天有点难过" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "抱抱你，今天辛苦了。");

    let (status, body) = send(&app, Method::POST, "/api/generate", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Missing userInput" }));

    let (status, body) = send(&app, Method::GET, "/api/generate", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({ "error": "Method not allowed" }));
}

#[tokio::test]
async fn test_generate_vendor_failure_is_500() {
    let (app, vendor) = app_with(None).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/generate",
        Some(json!({ "userInput": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "AI failed" }));
    assert_eq!(vendor.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_companion_creation_spends_points() {
    let app = app().await;

    let (status, fan) = send(
        &app,
        Method::POST,
        "/api/fans",
        Some(json!({ "name": "Momo", "avatar": "✨", "style": "cute" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(fan["isActive"], true);
    assert_eq!(fan["style"], "cute");

    let (_, me) = send(&app, Method::GET, "/api/me", None).await;
    assert_eq!(me["points"], 0);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/fans",
        Some(json!({ "name": "Second", "avatar": "🔥" })),
    )
    .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["error"]["code"], "insufficient_points");
    assert_eq!(body["error"]["details"]["required"], 10);

    let (_, list) = send(&app, Method::GET, "/api/fans", None).await;
    assert_eq!(list["fans"].as_array().unwrap().len(), 1);
    assert_eq!(list["maxFans"], 5);
}

#[tokio::test]
async fn test_free_tier_second_post_is_rejected() {
    let app = app().await;

    let (status, entry) = send(
        &app,
        Method::POST,
        "/api/entries",
        Some(json!({ "content": "第一篇", "mood": "😌" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(entry["aiComments"][0]["fanName"], "Large");
    assert_eq!(entry["aiComments"][0]["content"], "抱抱你，今天辛苦了。");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/entries",
        Some(json!({ "content": "第二篇" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "limit_reached");
    assert_eq!(body["error"]["details"]["limit"], "post");
    assert_eq!(
        body["error"]["message"],
        "今日发布次数已用完，升级会员即可继续记录"
    );

    let (_, me) = send(&app, Method::GET, "/api/me", None).await;
    assert_eq!(me["dailyPostsCount"], 1);
    assert_eq!(me["canPost"], false);

    let (_, list) = send(&app, Method::GET, "/api/entries", None).await;
    assert_eq!(list["total"], 1);
}

#[tokio::test]
async fn test_relay_failure_still_creates_entry() {
    let (app, _) = app_with(None).await;

    let (status, entry) = send(
        &app,
        Method::POST,
        "/api/entries",
        Some(json!({ "content": "rainy", "mood": "😔" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(entry["aiComments"][0]["content"], "AI 回复暂时不可用");

    let id = entry["id"].as_str().unwrap();
    let (status, stored) = send(&app, Method::GET, &format!("/api/entries/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored["content"], "rainy");
}

#[tokio::test]
async fn test_english_fallbacks_follow_preferences() {
    let (app, _) = app_with(None).await;

    let (status, prefs) = send(
        &app,
        Method::PUT,
        "/api/preferences",
        Some(json!({ "language": "en", "theme": "purple" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(prefs, json!({ "theme": "purple", "language": "en" }));

    let (_, entry) = send(
        &app,
        Method::POST,
        "/api/entries",
        Some(json!({ "content": "rainy" })),
    )
    .await;
    assert_eq!(
        entry["aiComments"][0]["content"],
        "AI reply is temporarily unavailable"
    );
}

#[tokio::test]
async fn test_entry_filter_and_views() {
    let app = app().await;
    send(
        &app,
        Method::POST,
        "/api/entries",
        Some(json!({ "content": "today", "mood": "🥰" })),
    )
    .await;

    let (status, list) = send(&app, Method::GET, "/api/entries?start_date=&end_date=", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["total"], 1);

    let (_, list) = send(
        &app,
        Method::GET,
        "/api/entries?start_date=2000-01-01&end_date=2000-01-31",
        None,
    )
    .await;
    assert_eq!(list["total"], 0);

    let (_, stats) = send(&app, Method::GET, "/api/stats", None).await;
    assert_eq!(stats["entryCount"], 1);
    assert_eq!(stats["streak"], 1);

    let (_, trend) = send(&app, Method::GET, "/api/mood-trend", None).await;
    assert_eq!(trend[0]["score"], 5);
    assert_eq!(trend[0]["mood"], "🥰");

    let (status, _) = send(&app, Method::GET, "/api/calendar?year=2024&month=13", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

fn voice_note(decoded_bytes: usize) -> String {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    format!("data:audio/webm;base64,{}", STANDARD.encode(vec![0u8; decoded_bytes]))
}

#[tokio::test]
async fn test_voice_note_under_limit_is_accepted() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/entries",
        Some(json!({ "content": "", "mood": "😌", "voiceData": voice_note(2_200_000) })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "validation_error");

    let voice = voice_note(1_700_000);
    let (status, entry) = send(
        &app,
        Method::POST,
        "/api/entries",
        Some(json!({ "content": "", "mood": "😌", "voiceData": voice })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(entry["voiceData"].as_str().map(str::len), Some(voice.len()));
}

#[tokio::test]
async fn test_chat_on_entry() {
    let app = app().await;
    let (_, entry) = send(
        &app,
        Method::POST,
        "/api/entries",
        Some(json!({ "content": "long day" })),
    )
    .await;
    let id = entry["id"].as_str().unwrap();

    let (status, turn) = send(
        &app,
        Method::POST,
        &format!("/api/entries/{id}/chat"),
        Some(json!({ "message": "can we talk?" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(turn["thread"], "default");
    assert_eq!(turn["messages"].as_array().unwrap().len(), 2);
    assert_eq!(turn["messages"][1]["role"], "model");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/entries/nope/chat",
        Some(json!({ "message": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_billing_flow() {
    let app = app().await;

    let (_, tiers) = send(&app, Method::GET, "/api/billing/tiers", None).await;
    assert_eq!(tiers.as_array().unwrap().len(), 3);
    assert_eq!(tiers[2]["cost"], 69);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/billing/tier",
        Some(json!({ "tier": "premium" })),
    )
    .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["error"]["details"]["required"], 69);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/billing/recharge",
        Some(json!({ "walletAddress": "0x1234" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["credited"], 100);
    assert_eq!(body["profile"]["points"], 110);
    assert_eq!(body["profile"]["isWeb3Connected"], true);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/billing/tier",
        Some(json!({ "tier": "premium" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["changed"], true);
    assert_eq!(body["profile"]["points"], 41);
    assert_eq!(body["profile"]["rules"]["dailyPosts"], Value::Null);
}

#[tokio::test]
async fn test_decision_helper_limit() {
    let app = app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/decision",
        Some(json!({ "question": "换工作吗？" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "抱抱你，今天辛苦了。");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/decision",
        Some(json!({ "question": "还是不换？" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["details"]["limit"], "flow");
}

#[tokio::test]
async fn test_onboarding_validation() {
    let app = app().await;

    let (status, body) = send(&app, Method::POST, "/api/onboarding", Some(json!({ "name": "" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "validation_error");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/onboarding",
        Some(json!({ "name": "Mia", "avatar": "🐱" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["onboardingCompleted"], true);
    assert_eq!(body["name"], "Mia");
}

#[tokio::test]
async fn test_insights_empty_journal_skips_vendor() {
    let (app, vendor) = app_with(Some("{}")).await;

    let (status, body) = send(&app, Method::GET, "/api/insights?period=monthly", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loading"], false);
    assert_eq!(body["summary"], "");
    assert_eq!(vendor.calls.load(Ordering::SeqCst), 0);
}
