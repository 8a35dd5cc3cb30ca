//! Authentication HTTP handlers

use axum::{extract::Extension, Json};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use super::extractors::AuthedHr;
use super::models::{Claims, HrUser};
use crate::common::{ApiError, AppState};

/// Create a signed JWT for an HR user id, valid for 7 days
pub fn generate_jwt(user_id: &str, jwt_secret: &str) -> Result<String, ApiError> {
    let exp = (Utc::now() + Duration::days(7)).timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::InternalServer(format!("token generation failed: {}", e)))
}

/// GET /api/me
///
/// Returns the authenticated user's record plus their derived admin flag.
pub async fn me_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedHr,
) -> Result<Json<serde_json::Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let user = sqlx::query_as::<_, HrUser>("SELECT * FROM hr_users WHERE id = ?")
        .bind(&authed.id)
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    let resp = serde_json::json!({
        "user": user,
        "is_admin": authed.is_admin
    });
    Ok(Json(resp))
}

/// POST /api/auth/logout
///
/// Stateless JWTs cannot be revoked server-side; the client drops the token.
pub async fn logout_handler(_authed: AuthedHr) -> Result<Json<serde_json::Value>, ApiError> {
    info!("User logout successful");
    let resp = serde_json::json!({
        "message": "Logout successful"
    });
    Ok(Json(resp))
}
