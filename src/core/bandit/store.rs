use super::params::{BetaParams, UserParams};
use super::sqlite::SqliteBanditStore;
use crate::config::{StoreBackend, StoreConfig};
use crate::core::types::Category;
use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePoolOptions;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

/// Async persistence contract for per-user Beta posteriors.
///
/// `get` returns only rows that exist; callers read through
/// [`super::params::params_for`] to fall back to the (2, 2) prior.
/// `increment` must be atomic per row: concurrent feedback on the same
/// (user, category, attribute) never loses an update.
pub trait BanditStore: Send + Sync {
    fn name(&self) -> &str;

    fn get<'a>(
        &'a self,
        user_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<UserParams>> + Send + 'a>>;

    fn increment<'a>(
        &'a self,
        user_id: &'a str,
        category: Category,
        attribute: &'a str,
        success: bool,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Process-local store. Every increment happens under one lock.
#[derive(Debug, Default)]
pub struct InMemoryBanditStore {
    users: Mutex<HashMap<String, UserParams>>,
}

impl InMemoryBanditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a posterior directly, bypassing feedback.
    pub fn seed(
        &self,
        user_id: &str,
        category: Category,
        attribute: &str,
        params: BetaParams,
    ) -> Result<()> {
        let mut users = self
            .users
            .lock()
            .map_err(|_| anyhow::anyhow!("bandit store lock poisoned"))?;
        users
            .entry(user_id.to_string())
            .or_default()
            .entry(category)
            .or_default()
            .insert(attribute.to_string(), params.sanitized());
        Ok(())
    }
}

impl BanditStore for InMemoryBanditStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn get<'a>(
        &'a self,
        user_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<UserParams>> + Send + 'a>> {
        Box::pin(async move {
            let users = self
                .users
                .lock()
                .map_err(|_| anyhow::anyhow!("bandit store lock poisoned"))?;
            Ok(users.get(user_id).cloned().unwrap_or_default())
        })
    }

    fn increment<'a>(
        &'a self,
        user_id: &'a str,
        category: Category,
        attribute: &'a str,
        success: bool,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let mut users = self
                .users
                .lock()
                .map_err(|_| anyhow::anyhow!("bandit store lock poisoned"))?;
            users
                .entry(user_id.to_string())
                .or_default()
                .entry(category)
                .or_default()
                .entry(attribute.to_string())
                .or_default()
                .record(success);
            Ok(())
        })
    }
}

/// Build the configured bandit store.
pub async fn create_bandit_store(config: &StoreConfig) -> Result<Arc<dyn BanditStore>> {
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(InMemoryBanditStore::new())),
        StoreBackend::Sqlite => {
            let pool = SqlitePoolOptions::new()
                .max_connections(config.pool_size())
                .connect(&config.sqlite_url)
                .await
                .with_context(|| format!("connect bandit store at {}", config.sqlite_url))?;
            let store = SqliteBanditStore::new(pool).await?;
            tracing::info!(url = %config.sqlite_url, "bandit store ready");
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bandit::params::params_for;

    #[tokio::test]
    async fn unknown_user_has_no_rows() {
        let store = InMemoryBanditStore::new();
        let params = store.get("nobody").await.unwrap();
        assert!(params.is_empty());
        assert_eq!(
            params_for(&params, Category::Color, "black"),
            BetaParams::default()
        );
    }

    #[tokio::test]
    async fn increment_creates_row_from_prior() {
        let store = InMemoryBanditStore::new();
        store
            .increment("u1", Category::Color, "black", true)
            .await
            .unwrap();
        store
            .increment("u1", Category::Color, "black", false)
            .await
            .unwrap();
        store
            .increment("u1", Category::Color, "black", true)
            .await
            .unwrap();

        let params = store.get("u1").await.unwrap();
        assert_eq!(
            params_for(&params, Category::Color, "black"),
            BetaParams::new(4.0, 3.0)
        );
    }

    #[tokio::test]
    async fn users_are_isolated() {
        let store = InMemoryBanditStore::new();
        store
            .increment("u1", Category::Garment, "dress", true)
            .await
            .unwrap();
        assert!(store.get("u2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_increments_are_not_lost() {
        let store = Arc::new(InMemoryBanditStore::new());
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .increment("u1", Category::Fabric, "wool", i % 2 == 0)
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let params = store.get("u1").await.unwrap();
        assert_eq!(
            params_for(&params, Category::Fabric, "wool"),
            BetaParams::new(18.0, 18.0)
        );
    }

    #[tokio::test]
    async fn factory_builds_memory_store_by_default() {
        let store = create_bandit_store(&StoreConfig::default()).await.unwrap();
        assert_eq!(store.name(), "memory");
    }

    #[tokio::test]
    async fn factory_builds_sqlite_store() {
        let config = StoreConfig {
            backend: StoreBackend::Sqlite,
            sqlite_url: "sqlite::memory:".into(),
            ..StoreConfig::default()
        };
        let store = create_bandit_store(&config).await.unwrap();
        assert_eq!(store.name(), "sqlite");
    }
}
