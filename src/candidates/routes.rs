// src/candidates/routes.rs

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Create the candidates router with application and candidate-access routes
pub fn candidates_routes() -> Router {
    Router::new()
        // Public routes
        .route("/api/jobs/:id/apply", post(handlers::submit_application))
        .route(
            "/api/candidate/test/:token",
            get(handlers::get_test_by_token).post(handlers::submit_test_by_token),
        )
        .route(
            "/api/candidate/interview/:token",
            get(handlers::get_interview_by_token).post(handlers::submit_interview_by_token),
        )
        // Admin application management routes
        .route(
            "/api/admin/jobs/:id/applications",
            get(handlers::admin_list_applications),
        )
        .route(
            "/api/admin/applications/:id",
            get(handlers::admin_get_application),
        )
        .route(
            "/api/admin/applications/:id/advance",
            post(handlers::admin_advance_application),
        )
        .route(
            "/api/admin/applications/:id/reject",
            post(handlers::admin_reject_application),
        )
        .route(
            "/api/admin/applications/:id/invite",
            post(handlers::admin_invite_application),
        )
        .route(
            "/api/admin/applications/:id/score",
            post(handlers::admin_record_score),
        )
        .route(
            "/api/admin/applications/:id/reanalyze",
            post(handlers::admin_reanalyze_application),
        )
        .route(
            "/api/admin/applications/bulk-action",
            post(handlers::bulk_application_action),
        )
        .route(
            "/api/admin/pipeline/analytics",
            get(handlers::admin_pipeline_analytics),
        )
}
