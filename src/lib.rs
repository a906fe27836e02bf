use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod clock;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod media;
pub mod models;
pub mod rate_limit;
pub mod services;
pub mod state;
pub mod storage;
pub mod views;

use config::Config;
use rate_limit::RateLimitState;
use services::Journal;
use state::Slice;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub journal: Arc<Journal>,
    pub ws_tx: broadcast::Sender<String>,
    pub rate_limiter: RateLimitState,
}

impl AppState {
    pub fn new(config: Config, journal: Journal) -> Self {
        let (ws_tx, _) = broadcast::channel::<String>(256);
        Self {
            rate_limiter: RateLimitState::new(config.ai_rate_limit_per_minute),
            config: Arc::new(config),
            journal: Arc::new(journal),
            ws_tx,
        }
    }

    /// Tells change-feed subscribers that `slice` was written.
    pub fn notify(&self, slice: Slice) {
        let msg = serde_json::json!({ "type": "state_changed", "slice": slice }).to_string();
        // No subscribers is not an error.
        let _ = self.ws_tx.send(msg);
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = std::iter::once(&config.frontend_url)
        .chain(&config.cors_extra_origins)
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(hv) => Some(hv),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

pub fn router(state: AppState) -> Router {
    // Routes that accept data-URL attachments get a body cap sized for them
    let media_limit = DefaultBodyLimit::max(state.config.media.body_limit());

    // Everything that reaches the AI vendor is rate limited per client IP
    let ai_routes = Router::new()
        .route(
            "/api/generate",
            post(handlers::generate::generate).fallback(handlers::generate::method_not_allowed),
        )
        .route(
            "/api/entries",
            post(handlers::entries::create_entry).layer(media_limit.clone()),
        )
        .route("/api/entries/:id/chat", post(handlers::entries::chat))
        .route("/api/insights", get(handlers::insights::get_insights))
        .route("/api/decision", post(handlers::decision::decide))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit_ai,
        ));

    let app_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route("/ws", get(handlers::ws::ws_handler))
        // Profile
        .route(
            "/api/me",
            get(handlers::profile::me)
                .put(handlers::profile::update_me)
                .layer(media_limit.clone()),
        )
        .route(
            "/api/onboarding",
            post(handlers::profile::complete_onboarding).layer(media_limit),
        )
        .route(
            "/api/preferences",
            get(handlers::profile::get_preferences).put(handlers::profile::update_preferences),
        )
        // Entries
        .route("/api/entries", get(handlers::entries::list_entries))
        .route("/api/entries/:id", get(handlers::entries::get_entry))
        // Views
        .route("/api/stats", get(handlers::views::stats))
        .route("/api/mood-trend", get(handlers::views::mood_trend))
        .route("/api/calendar", get(handlers::views::calendar))
        // Companions
        .route(
            "/api/fans",
            get(handlers::fans::list_fans).post(handlers::fans::create_fan),
        )
        .route(
            "/api/fans/:id",
            put(handlers::fans::update_fan).delete(handlers::fans::delete_fan),
        )
        // Billing
        .route("/api/billing/tiers", get(handlers::billing::list_tiers))
        .route("/api/billing/tier", post(handlers::billing::select_tier))
        .route("/api/billing/recharge", post(handlers::billing::recharge));

    let cors = cors_layer(&state.config);

    Router::new()
        .merge(app_routes)
        .merge(ai_routes)
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
