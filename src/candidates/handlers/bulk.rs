// src/candidates/handlers/bulk.rs

use axum::extract::{Extension, Json};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::auth::AuthedHr;
use crate::common::{ApiError, AppState};
use crate::pipeline::batch::{apply_bulk_action, BulkActionRequest, BulkActionSummary};
use crate::pipeline::engine::TransitionEngine;

/// POST /api/admin/applications/bulk-action
///
/// Invalid top-level parameters fail the whole request before any write;
/// per-item failures are reported in the summary and never abort siblings.
pub async fn bulk_application_action(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedHr,
    Json(request): Json<BulkActionRequest>,
) -> Result<Json<BulkActionSummary>, ApiError> {
    authed.require_admin()?;
    let state = state_lock.read().await.clone();

    let engine = TransitionEngine::from_state(&state);
    let summary = apply_bulk_action(&engine, &state.db, &request, &authed.email).await?;

    info!(
        action = %request.action,
        total = request.application_ids.len(),
        success_count = summary.success_count,
        failed_count = summary.failed_count,
        user_id = %authed.id,
        "Bulk action applied"
    );

    Ok(Json(summary))
}
