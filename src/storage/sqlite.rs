use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use super::{footprint, KeyValueStore, StorageError, StorageKey, StorageResult};

/// SQLite-backed store: a single `kv_store` table.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    quota: Option<u64>,
}

impl SqliteStore {
    /// Opens the database and applies pending migrations.
    pub async fn connect(database_url: &str, quota: Option<u64>) -> StorageResult<Self> {
        // Every connection to an in-memory database sees its own empty database.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(std::time::Duration::from_secs(5))
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!(database_url = %database_url, ?quota, "Storage ready");

        Ok(Self { pool, quota })
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: StorageKey) -> StorageResult<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM kv_store WHERE key = ?1")
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn set(&self, key: StorageKey, value: &str) -> StorageResult<()> {
        let mut tx = self.pool.begin().await?;

        if let Some(quota) = self.quota {
            let others = sqlx::query_scalar::<_, i64>(
                r#"
                SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0)
                FROM kv_store
                WHERE key != ?1
                "#,
            )
            .bind(key.as_str())
            .fetch_one(&mut *tx)
            .await?;

            let needed = others.max(0) as u64 + footprint(key, value);
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }

        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, CURRENT_TIMESTAMP)
            ON CONFLICT (key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key.as_str())
        .bind(value)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn ping(&self) -> StorageResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get_overwrites() {
        let store = SqliteStore::connect("sqlite::memory:", None).await.unwrap();
        assert_eq!(store.get(StorageKey::Theme).await.unwrap(), None);

        store.set(StorageKey::Theme, "purple").await.unwrap();
        store.set(StorageKey::Theme, "indigo").await.unwrap();
        assert_eq!(
            store.get(StorageKey::Theme).await.unwrap().as_deref(),
            Some("indigo")
        );
        store.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_quota_counts_other_keys() {
        let store = SqliteStore::connect("sqlite::memory:", Some(64)).await.unwrap();
        store.set(StorageKey::Language, "en").await.unwrap();

        let big = "x".repeat(60);
        let err = store.set(StorageKey::Entries, &big).await.unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { quota: 64, .. }));
        assert_eq!(store.get(StorageKey::Entries).await.unwrap(), None);

        store.set(StorageKey::Entries, "[]").await.unwrap();
    }
}
