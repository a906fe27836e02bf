//! The persistent application state and its storage mirror.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::entry::DiaryEntry;
use crate::models::fan::AiFan;
use crate::models::locale::{Language, ThemeColor};
use crate::models::user::UserConfig;
use crate::storage::{schema, KeyValueStore, StorageKey};

/// Entries kept after a failed write of the entry list.
pub const ENTRIES_KEPT_ON_WRITE_FAILURE: usize = 50;

/// State slices, each mirrored under its own storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Slice {
    Entries,
    User,
    Fans,
    Theme,
    Language,
    Onboarding,
}

impl Slice {
    fn key(self) -> StorageKey {
        match self {
            Slice::Entries => StorageKey::Entries,
            Slice::User => StorageKey::UserConfig,
            Slice::Fans => StorageKey::Fans,
            Slice::Theme => StorageKey::Theme,
            Slice::Language => StorageKey::Language,
            Slice::Onboarding => StorageKey::OnboardingCompleted,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppData {
    /// Newest first.
    pub entries: Vec<DiaryEntry>,
    pub user: UserConfig,
    pub fans: Vec<AiFan>,
    pub theme: ThemeColor,
    pub language: Language,
    pub onboarding_completed: bool,
}

impl AppData {
    pub fn default_for(today: NaiveDate) -> Self {
        Self {
            entries: Vec::new(),
            user: UserConfig::default_for(today),
            fans: Vec::new(),
            theme: ThemeColor::default(),
            language: Language::default(),
            onboarding_completed: false,
        }
    }

    /// Reads every slice, falling back to its default when absent or
    /// unreadable, and upgrades stored entries to the current schema.
    pub async fn load(store: &dyn KeyValueStore, today: NaiveDate) -> Self {
        let mut data = Self::default_for(today);

        if let Some(raw) = read(store, StorageKey::UserConfig).await {
            match UserConfig::from_stored(&raw, today) {
                Some(user) => data.user = user,
                None => tracing::warn!("Stored user config unreadable, using defaults"),
            }
        }

        if let Some(raw) = read(store, StorageKey::Fans).await {
            match serde_json::from_str(&raw) {
                Ok(fans) => data.fans = fans,
                Err(e) => tracing::warn!(error = %e, "Stored companions unreadable, using defaults"),
            }
        }

        if let Some(raw) = read(store, StorageKey::Theme).await {
            data.theme = raw.parse().unwrap_or_default();
        }
        if let Some(raw) = read(store, StorageKey::Language).await {
            data.language = raw.parse().unwrap_or_default();
        }
        data.onboarding_completed = read(store, StorageKey::OnboardingCompleted)
            .await
            .is_some_and(|v| v.trim() == "true");

        let version = schema::parse_version(read(store, StorageKey::SchemaVersion).await.as_deref());
        let mut write_back = version < schema::CURRENT_VERSION;

        if let Some(raw) = read(store, StorageKey::Entries).await {
            match schema::upgrade(&raw, version) {
                Some(upgraded) => {
                    write_back |= upgraded.needs_write_back(version);
                    data.entries = upgraded.entries;
                }
                None => tracing::warn!("Stored diary entries unreadable, starting empty"),
            }
        }

        if write_back {
            data.persist(store, Slice::Entries).await;
            if let Err(e) = store
                .set(StorageKey::SchemaVersion, &schema::CURRENT_VERSION.to_string())
                .await
            {
                tracing::warn!(error = %e, "Failed to record entry schema version");
            }
        }

        tracing::info!(
            entries = data.entries.len(),
            fans = data.fans.len(),
            tier = ?data.user.subscription_tier,
            "Application state loaded"
        );

        data
    }

    /// Lazily rolls the daily counters over. Returns whether they were reset.
    pub fn refresh_day(&mut self, today: NaiveDate) -> bool {
        self.user.reset_daily_counters(today)
    }

    pub fn total_chat_messages(&self) -> usize {
        self.entries.iter().map(DiaryEntry::chat_message_count).sum()
    }

    pub fn active_fans(&self) -> Vec<AiFan> {
        self.fans.iter().filter(|f| f.is_active).cloned().collect()
    }

    /// Mirrors one slice to storage. Failures never propagate: a failed
    /// entry-list write truncates the list and writes it once more.
    pub async fn persist(&mut self, store: &dyn KeyValueStore, slice: Slice) {
        let value = match self.encode(slice) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, ?slice, "Failed to encode state slice");
                return;
            }
        };

        let Err(e) = store.set(slice.key(), &value).await else {
            return;
        };

        if slice != Slice::Entries {
            tracing::warn!(error = %e, ?slice, "Failed to persist state slice");
            return;
        }

        tracing::warn!(
            error = %e,
            entries = self.entries.len(),
            kept = ENTRIES_KEPT_ON_WRITE_FAILURE,
            "Entry list write failed, truncating"
        );
        self.entries.truncate(ENTRIES_KEPT_ON_WRITE_FAILURE);

        let retry = match self.encode(Slice::Entries) {
            Ok(v) => store.set(StorageKey::Entries, &v).await.map_err(anyhow::Error::from),
            Err(e) => Err(e.into()),
        };
        if let Err(e) = retry {
            tracing::error!(error = %e, "Truncated entry list write failed, giving up");
        }
    }

    fn encode(&self, slice: Slice) -> Result<String, serde_json::Error> {
        Ok(match slice {
            Slice::Entries => serde_json::to_string(&self.entries)?,
            Slice::User => serde_json::to_string(&self.user)?,
            Slice::Fans => serde_json::to_string(&self.fans)?,
            Slice::Theme => self.theme.as_str().to_string(),
            Slice::Language => self.language.code().to_string(),
            Slice::Onboarding => self.onboarding_completed.to_string(),
        })
    }
}

async fn read(store: &dyn KeyValueStore, key: StorageKey) -> Option<String> {
    match store.get(key).await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, key = key.as_str(), "Storage read failed");
            None
        }
    }
}
