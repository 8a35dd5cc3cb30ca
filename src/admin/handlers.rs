// src/admin/handlers.rs

use axum::{extract::Extension, Json};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::auth::AuthedHr;
use crate::common::{safe_token_log, ApiError, AppState};

/// Keys whose values are credentials and never echoed back in full
const SENSITIVE_KEYS: [&str; 3] = [
    "openai_api_key",
    "aws_secret_access_key",
    "aws_access_key_id",
];

#[derive(Debug, Deserialize)]
pub struct UpdateSettingsRequest {
    /// key -> value; an empty value deletes the setting
    pub settings: HashMap<String, String>,
}

/// GET /api/admin/settings - All system settings, credentials masked
pub async fn get_system_settings(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedHr,
) -> Result<Json<HashMap<String, String>>, ApiError> {
    authed.require_admin()?;
    let state = state_lock.read().await.clone();

    let mut settings = state
        .settings_service
        .get_all_settings()
        .await
        .map_err(|e| ApiError::InternalServer(format!("Failed to fetch settings: {}", e)))?;

    for key in SENSITIVE_KEYS {
        if let Some(value) = settings.get_mut(key) {
            *value = safe_token_log(value);
        }
    }

    Ok(Json(settings))
}

/// PUT /api/admin/settings - Update system settings
pub async fn update_system_settings(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedHr,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authed.require_admin()?;
    let state = state_lock.read().await.clone();

    let mut updated_count = 0;
    let mut errors = Vec::new();

    for (key, value) in &request.settings {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        {
            errors.push(format!("Invalid setting key: {}", key));
            continue;
        }

        let result = if value.is_empty() {
            state.settings_service.delete_setting(key).await
        } else {
            state
                .settings_service
                .set_setting(key, value, &authed.id)
                .await
        };

        match result {
            Ok(()) => updated_count += 1,
            Err(e) => errors.push(format!("Failed to update '{}': {}", key, e)),
        }
    }

    info!(
        admin_user_id = %authed.id,
        updated_count = updated_count,
        error_count = errors.len(),
        "System settings updated"
    );

    Ok(Json(serde_json::json!({
        "updated_count": updated_count,
        "errors": errors,
    })))
}
