use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{footprint, KeyValueStore, StorageError, StorageKey, StorageResult};

/// Process-local store with the same quota semantics as [`super::SqliteStore`].
#[derive(Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<StorageKey, String>>>,
    quota: Option<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: u64) -> Self {
        Self {
            values: Arc::default(),
            quota: Some(quota),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: StorageKey) -> StorageResult<Option<String>> {
        Ok(self.values.lock().await.get(&key).cloned())
    }

    async fn set(&self, key: StorageKey, value: &str) -> StorageResult<()> {
        let mut values = self.values.lock().await;

        if let Some(quota) = self.quota {
            let others: u64 = values
                .iter()
                .filter(|(k, _)| **k != key)
                .map(|(k, v)| footprint(*k, v))
                .sum();
            let needed = others + footprint(key, value);
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }

        values.insert(key, value.to_string());
        Ok(())
    }

    async fn ping(&self) -> StorageResult<()> {
        Ok(())
    }
}
