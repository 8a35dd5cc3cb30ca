// src/jobs/routes.rs

use axum::{routing::get, Router};

use super::handlers;

/// Create the jobs router with all job-related routes
pub fn jobs_routes() -> Router {
    Router::new()
        // Public routes
        .route("/api/jobs", get(handlers::list_active_jobs))
        .route("/api/jobs/:id", get(handlers::get_active_job))
        // Admin job management routes
        .route(
            "/api/admin/jobs",
            get(handlers::admin_list_jobs).post(handlers::admin_create_job),
        )
        .route(
            "/api/admin/jobs/:id",
            get(handlers::admin_get_job)
                .put(handlers::admin_update_job)
                .delete(handlers::admin_delete_job),
        )
}
