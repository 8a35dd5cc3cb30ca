// src/jobs/handlers/public.rs

use axum::{
    extract::{Extension, Path},
    response::Json,
};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::common::{ApiError, AppState};
use crate::jobs::models::*;

const JOB_COLUMNS: &str = "id, title, description, location, requirements, status, \
enabled_stages, auto_advance_thresholds, scoring_weights, created_by, created_at, updated_at";

/// GET /api/jobs - List open positions. Only active jobs are visible here.
pub async fn list_active_jobs(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
) -> Result<Json<JobListResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let jobs = sqlx::query_as::<_, Job>(&format!(
        "SELECT {} FROM jobs WHERE status = 'active' ORDER BY created_at DESC",
        JOB_COLUMNS
    ))
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    let jobs: Vec<JobResponse> = jobs.into_iter().map(Into::into).collect();
    let total = jobs.len();
    Ok(Json(JobListResponse { jobs, total }))
}

/// GET /api/jobs/:id - Fetch one active job
pub async fn get_active_job(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(id): Path<String>,
) -> Result<Json<JobResponse>, ApiError> {
    let state = state_lock.read().await.clone();

    let job = sqlx::query_as::<_, Job>(&format!(
        "SELECT {} FROM jobs WHERE id = ? AND status = 'active'",
        JOB_COLUMNS
    ))
    .bind(&id)
    .fetch_optional(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?
    .ok_or_else(|| ApiError::NotFound("job not found".to_string()))?;

    Ok(Json(job.into()))
}
