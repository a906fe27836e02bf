use anyhow::Context;
use std::sync::Arc;

use moodlog_api::clock::Clock;
use moodlog_api::config::Config;
use moodlog_api::services::relay::{ChatCompletionsClient, Relay};
use moodlog_api::services::Journal;
use moodlog_api::storage::SqliteStore;
use moodlog_api::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moodlog_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Config::from_env().context("Invalid configuration")?;

    // Storage (migrations run on connect)
    let store = SqliteStore::connect(&config.database_url, config.storage_quota_bytes)
        .await
        .context("Failed to open storage")?;

    let relay = Relay::new(Arc::new(ChatCompletionsClient::from_config(&config)?));
    let clock = Clock::new(config.utc_offset()?);
    let journal = Journal::open(Arc::new(store), relay, clock, config.media).await;

    let state = AppState::new(config, journal);
    state.rate_limiter.spawn_cleanup_worker();

    let addr = state.config.listen_addr();
    let app = moodlog_api::router(state);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    // Connect info provides the client IP for rate limiting
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
