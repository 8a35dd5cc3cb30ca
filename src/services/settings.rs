// src/services/settings.rs
//! DB-backed system settings with an in-memory cache.
//!
//! External-service credentials (SES, OpenAI) live in the `system_settings`
//! table so they can be rotated without a restart; migrations seed them from
//! environment variables on first boot.

use sqlx::SqlitePool;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug)]
pub struct SettingsService {
    db: SqlitePool,
    cache: RwLock<HashMap<String, String>>,
}

impl SettingsService {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Get a single setting, consulting the cache first
    pub async fn get_setting(&self, key: &str) -> Result<Option<String>, SettingsError> {
        {
            let cache = self.cache.read().await;
            if let Some(value) = cache.get(key) {
                return Ok(Some(value.clone()));
            }
        }

        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM system_settings WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.db)
                .await?
                .flatten();

        if let Some(value) = &value {
            let mut cache = self.cache.write().await;
            cache.insert(key.to_string(), value.clone());
        }

        Ok(value)
    }

    /// Fetch several settings at once
    pub async fn get_settings(
        &self,
        keys: &[&str],
    ) -> Result<HashMap<String, Option<String>>, SettingsError> {
        let mut out = HashMap::with_capacity(keys.len());
        for key in keys {
            out.insert(key.to_string(), self.get_setting(key).await?);
        }
        Ok(out)
    }

    /// All settings as a key/value map, straight from the database
    pub async fn get_all_settings(&self) -> Result<HashMap<String, String>, SettingsError> {
        let rows: Vec<(String, Option<String>)> =
            sqlx::query_as("SELECT key, value FROM system_settings ORDER BY key")
                .fetch_all(&self.db)
                .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v)))
            .collect())
    }

    /// Upsert a setting and refresh the cache
    pub async fn set_setting(
        &self,
        key: &str,
        value: &str,
        updated_by: &str,
    ) -> Result<(), SettingsError> {
        sqlx::query(
            r#"
            INSERT INTO system_settings (key, value, updated_at, updated_by)
            VALUES (?, ?, datetime('now'), ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at,
                updated_by = excluded.updated_by
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(updated_by)
        .execute(&self.db)
        .await?;

        let mut cache = self.cache.write().await;
        cache.insert(key.to_string(), value.to_string());
        debug!(key = %key, "Setting updated");

        Ok(())
    }

    /// Remove a setting entirely and drop it from the cache
    pub async fn delete_setting(&self, key: &str) -> Result<(), SettingsError> {
        sqlx::query("DELETE FROM system_settings WHERE key = ?")
            .bind(key)
            .execute(&self.db)
            .await?;

        let mut cache = self.cache.write().await;
        cache.remove(key);
        debug!(key = %key, "Setting deleted");

        Ok(())
    }
}
