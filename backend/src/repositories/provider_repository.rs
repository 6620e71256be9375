//! Database repository for SSO provider records.
//!
//! Provides the reads the login flow needs and the writes used by the
//! provider administration endpoints.

use crate::database::models::{CreateSsoProvider, SsoProvider};
use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;

const PROVIDER_COLUMNS: &str = "id, name, protocol, settings, is_enabled, created_at, updated_at, is_deleted, deleted_at";

/// Repository for SSO provider database operations.
pub struct ProviderRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> ProviderRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Stores a new provider.
    ///
    /// # Returns
    /// The newly created provider with timestamps populated
    pub async fn create_provider(&self, provider: CreateSsoProvider) -> Result<SsoProvider> {
        let now = Utc::now();
        let query = format!(
            r#"
            INSERT INTO sso_providers (id, name, protocol, settings, is_enabled, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            PROVIDER_COLUMNS
        );

        let provider = sqlx::query_as::<_, SsoProvider>(&query)
            .bind(provider.id)
            .bind(provider.name)
            .bind(provider.protocol)
            .bind(provider.settings)
            .bind(provider.is_enabled)
            .bind(now)
            .bind(now)
            .fetch_one(self.pool)
            .await?;

        Ok(provider)
    }

    /// Retrieves a provider by its ID.
    ///
    /// # Returns
    /// `Some(SsoProvider)` if found and not deleted, `None` otherwise
    pub async fn get_provider_by_id(&self, id: &str) -> Result<Option<SsoProvider>> {
        let query = format!(
            "SELECT {} FROM sso_providers WHERE id = ? AND is_deleted = 0",
            PROVIDER_COLUMNS
        );

        let provider = sqlx::query_as::<_, SsoProvider>(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(provider)
    }

    /// Lists enabled providers ordered by name.
    pub async fn list_enabled_providers(&self) -> Result<Vec<SsoProvider>> {
        let query = format!(
            "SELECT {} FROM sso_providers WHERE is_enabled = 1 AND is_deleted = 0 ORDER BY name",
            PROVIDER_COLUMNS
        );

        let providers = sqlx::query_as::<_, SsoProvider>(&query)
            .fetch_all(self.pool)
            .await?;

        Ok(providers)
    }

    /// Checks if an active provider already uses this name.
    pub async fn provider_name_exists(&self, name: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sso_providers WHERE name = ? AND is_deleted = 0",
        )
        .bind(name)
        .fetch_one(self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Soft-deletes a provider. Returns `false` when nothing was deleted.
    pub async fn delete_provider(&self, id: &str) -> Result<bool> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE sso_providers SET is_deleted = 1, deleted_at = ?, updated_at = ? WHERE id = ? AND is_deleted = 0",
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
