use super::params::{BetaParams, DEFAULT_ALPHA, DEFAULT_BETA, UserParams};
use super::store::BanditStore;
use crate::core::types::Category;
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::SqlitePool;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

/// SQLite-backed bandit store using an sqlx pool.
pub struct SqliteBanditStore {
    pool: SqlitePool,
}

impl SqliteBanditStore {
    /// Wrap an existing pool and create the table if needed.
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS bandit_params (
                 user_id TEXT NOT NULL,
                 category TEXT NOT NULL,
                 attribute TEXT NOT NULL,
                 alpha REAL NOT NULL,
                 beta REAL NOT NULL,
                 updated_at TEXT NOT NULL,
                 PRIMARY KEY (user_id, category, attribute)
             )",
        )
        .execute(&pool)
        .await
        .context("create bandit_params table")?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl BanditStore for SqliteBanditStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn get<'a>(
        &'a self,
        user_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<UserParams>> + Send + 'a>> {
        Box::pin(async move {
            let rows = sqlx::query(
                "SELECT category, attribute, alpha, beta
                 FROM bandit_params
                 WHERE user_id = $1",
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .context("query bandit params by user")?;

            let mut params = UserParams::new();
            for row in rows {
                let category_raw: String = row.try_get("category")?;
                let Ok(category) = Category::from_str(&category_raw) else {
                    tracing::warn!(user_id, category = %category_raw, "skipping unknown bandit category");
                    continue;
                };
                let attribute: String = row.try_get("attribute")?;
                let alpha: f64 = row.try_get("alpha")?;
                let beta: f64 = row.try_get("beta")?;
                params
                    .entry(category)
                    .or_default()
                    .insert(attribute, BetaParams::new(alpha, beta));
            }
            Ok(params)
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
            let (alpha_delta, beta_delta) = if success { (1.0, 0.0) } else { (0.0, 1.0) };

            sqlx::query(
                "INSERT INTO bandit_params (user_id, category, attribute, alpha, beta, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 ON CONFLICT (user_id, category, attribute) DO UPDATE SET
                     alpha = bandit_params.alpha + $7,
                     beta = bandit_params.beta + $8,
                     updated_at = excluded.updated_at",
            )
            .bind(user_id)
            .bind(category.to_string())
            .bind(attribute)
            .bind(DEFAULT_ALPHA + alpha_delta)
            .bind(DEFAULT_BETA + beta_delta)
            .bind(Utc::now().to_rfc3339())
            .bind(alpha_delta)
            .bind(beta_delta)
            .execute(&self.pool)
            .await
            .with_context(|| format!("increment bandit params for {category}/{attribute}"))?;

            Ok(())
        })
    }
}
