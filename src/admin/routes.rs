// src/admin/routes.rs

use axum::{routing::get, Router};

use super::handlers;

/// System administration routes
pub fn admin_routes() -> Router {
    Router::new().route(
        "/api/admin/settings",
        get(handlers::get_system_settings).put(handlers::update_system_settings),
    )
}
