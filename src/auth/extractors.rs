//! Authentication extractors for Axum

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use super::models::{Claims, HrUser};
use crate::common::{safe_email_log, ApiError, AppState};

/// Authenticated HR user extractor
///
/// Validates the bearer JWT, loads the user row and derives the admin flag
/// from the configured admin email list.
#[derive(Debug)]
pub struct AuthedHr {
    pub id: String,
    pub email: String,
    pub is_admin: bool,
}

impl AuthedHr {
    /// Admin-only guard used by administrative handlers
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin {
            Ok(())
        } else {
            warn!(
                user_id = %self.id,
                email = %safe_email_log(&self.email),
                "Admin access denied"
            );
            Err(ApiError::Forbidden("admin access required".into()))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthedHr
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(state_lock): Extension<Arc<RwLock<AppState>>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let app_state = state_lock.read().await.clone();

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());

        let token = match token {
            Some(t) => t,
            None => {
                warn!("Authentication failed: missing Authorization header");
                return Err(ApiError::Unauthorized("missing auth".into()));
            }
        };

        // Accept "Bearer <token>" or a raw token
        let bare_token = if let Some(rest) = token.strip_prefix("Bearer ") {
            rest.to_string()
        } else {
            token
        };

        let decoded = match decode::<Claims>(
            &bare_token,
            &DecodingKey::from_secret(app_state.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        ) {
            Ok(d) => d,
            Err(e) => {
                warn!(error = %e, "JWT token validation failed");
                return Err(ApiError::Unauthorized("invalid token".into()));
            }
        };

        let user_id = decoded.claims.sub;

        let user: Option<HrUser> =
            sqlx::query_as::<_, HrUser>("SELECT * FROM hr_users WHERE id = ?")
                .bind(&user_id)
                .fetch_optional(&app_state.db)
                .await
                .map_err(|e| {
                    error!(
                        error = %e,
                        user_id = %user_id,
                        "Database error during user lookup in authentication"
                    );
                    ApiError::DatabaseError(e)
                })?;

        match user {
            Some(u) => {
                let is_admin = app_state.admin_emails.contains(&u.email.to_lowercase());
                debug!(
                    user_id = %u.id,
                    email = %safe_email_log(&u.email),
                    is_admin = is_admin,
                    "User authenticated via extractor"
                );
                Ok(AuthedHr {
                    id: u.id,
                    email: u.email,
                    is_admin,
                })
            }
            None => {
                warn!(user_id = %user_id, "Authentication failed: user not found in database");
                Err(ApiError::Unauthorized("user not found".into()))
            }
        }
    }
}
