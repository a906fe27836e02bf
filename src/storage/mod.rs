//! Key/value persistence for the application state.
//!
//! Each state slice lives under one key as an opaque string (JSON for
//! records, a bare string for preferences). Stores enforce a byte quota over
//! all keys and values, the way browser storage does; callers react to
//! [`StorageError::QuotaExceeded`] by shrinking what they write.

pub mod memory;
pub mod schema;
pub mod sqlite;

use async_trait::async_trait;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage quota exceeded: {needed} bytes needed, quota is {quota}")]
    QuotaExceeded { needed: u64, quota: u64 },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Keys of the persisted slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Entries,
    UserConfig,
    Fans,
    Theme,
    Language,
    OnboardingCompleted,
    SchemaVersion,
}

impl StorageKey {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageKey::Entries => "ai_large_diary_data",
            StorageKey::UserConfig => "ai_large_user_config",
            StorageKey::Fans => "ai_large_fans_config",
            StorageKey::Theme => "ai_large_theme_color",
            StorageKey::Language => "app_lang",
            StorageKey::OnboardingCompleted => "ai_large_onboarding_completed",
            StorageKey::SchemaVersion => "ai_large_schema_version",
        }
    }
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: StorageKey) -> StorageResult<Option<String>>;

    /// Replaces the value under `key`. Fails without writing when the
    /// result would exceed the quota.
    async fn set(&self, key: StorageKey, value: &str) -> StorageResult<()>;

    async fn ping(&self) -> StorageResult<()>;
}

/// Bytes a key/value pair counts against the quota.
pub(crate) fn footprint(key: StorageKey, value: &str) -> u64 {
    (key.as_str().len() + value.len()) as u64
}
