// src/jobs/handlers/admin.rs

use axum::{
    extract::{Extension, Path},
    response::Json,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::auth::AuthedHr;
use crate::common::{generate_job_id, ApiError, AppState, Validator};
use crate::jobs::models::*;
use crate::jobs::validators::JobValidator;

const JOB_COLUMNS: &str = "id, title, description, location, requirements, status, \
enabled_stages, auto_advance_thresholds, scoring_weights, created_by, created_at, updated_at";

/// POST /api/admin/jobs - Create a new job
pub async fn admin_create_job(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedHr,
    Json(body): Json<CreateJob>,
) -> Result<Json<JobResponse>, ApiError> {
    authed.require_admin()?;

    let validation = JobValidator.validate(&body);
    if !validation.is_valid {
        return Err(validation.into());
    }

    let state = state_lock.read().await.clone();
    let id = generate_job_id();

    let requirements_json = body
        .requirements
        .as_ref()
        .map(|r| serde_json::to_string(r).unwrap_or_else(|_| "[]".to_string()));

    let pipeline = body.pipeline.unwrap_or_default();
    let enabled_stages_json = serde_json::to_string(&pipeline.enabled_stages)
        .map_err(|e| ApiError::InternalServer(e.to_string()))?;
    let thresholds_json = serde_json::to_string(&pipeline.auto_advance_thresholds)
        .map_err(|e| ApiError::InternalServer(e.to_string()))?;
    let weights_json = serde_json::to_string(&pipeline.scoring_weights)
        .map_err(|e| ApiError::InternalServer(e.to_string()))?;

    let status = body.status.as_deref().unwrap_or("draft");

    sqlx::query(
        r#"INSERT INTO jobs (
            id, title, description, location, requirements, status,
            enabled_stages, auto_advance_thresholds, scoring_weights,
            created_by, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, datetime('now'), datetime('now'))"#,
    )
    .bind(&id)
    .bind(&body.title)
    .bind(body.description.as_deref())
    .bind(body.location.as_deref())
    .bind(requirements_json.as_deref())
    .bind(status)
    .bind(&enabled_stages_json)
    .bind(&thresholds_json)
    .bind(&weights_json)
    .bind(&authed.id)
    .execute(&state.db)
    .await
    .map_err(|e| {
        error!(
            error = %e,
            job_id = %id,
            title = %body.title,
            user_id = %authed.id,
            "Database error creating job"
        );
        ApiError::DatabaseError(e)
    })?;

    info!(job_id = %id, title = %body.title, user_id = %authed.id, "Job created");

    let job = sqlx::query_as::<_, Job>(&format!("SELECT {} FROM jobs WHERE id = ?", JOB_COLUMNS))
        .bind(&id)
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    Ok(Json(job.into()))
}

/// PUT /api/admin/jobs/:id - Update a job
pub async fn admin_update_job(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedHr,
    Path(id): Path<String>,
    Json(body): Json<UpdateJob>,
) -> Result<Json<JobResponse>, ApiError> {
    authed.require_admin()?;

    if body.is_empty() {
        return Err(ApiError::BadRequest(
            "at least one field must be provided".to_string(),
        ));
    }

    let validation = JobValidator.validate(&body);
    if !validation.is_valid {
        return Err(validation.into());
    }

    let state = state_lock.read().await.clone();

    let existing =
        sqlx::query_as::<_, Job>(&format!("SELECT {} FROM jobs WHERE id = ?", JOB_COLUMNS))
            .bind(&id)
            .fetch_optional(&state.db)
            .await
            .map_err(ApiError::DatabaseError)?
            .ok_or_else(|| ApiError::NotFound("job not found".to_string()))?;

    let requirements_json = match &body.requirements {
        Some(r) => Some(serde_json::to_string(r).unwrap_or_else(|_| "[]".to_string())),
        None => existing.requirements,
    };

    let (enabled_stages_json, thresholds_json, weights_json) = match &body.pipeline {
        Some(p) => (
            Some(serde_json::to_string(&p.enabled_stages).unwrap_or_else(|_| "[]".to_string())),
            Some(
                serde_json::to_string(&p.auto_advance_thresholds)
                    .unwrap_or_else(|_| "{}".to_string()),
            ),
            Some(serde_json::to_string(&p.scoring_weights).unwrap_or_else(|_| "{}".to_string())),
        ),
        None => (
            existing.enabled_stages,
            existing.auto_advance_thresholds,
            existing.scoring_weights,
        ),
    };

    sqlx::query(
        r#"UPDATE jobs SET
            title = ?, description = ?, location = ?, requirements = ?, status = ?,
            enabled_stages = ?, auto_advance_thresholds = ?, scoring_weights = ?,
            updated_at = datetime('now')
        WHERE id = ?"#,
    )
    .bind(body.title.as_deref().unwrap_or(&existing.title))
    .bind(body.description.as_deref().or(existing.description.as_deref()))
    .bind(body.location.as_deref().or(existing.location.as_deref()))
    .bind(requirements_json.as_deref())
    .bind(body.status.as_deref().or(existing.status.as_deref()))
    .bind(enabled_stages_json.as_deref())
    .bind(thresholds_json.as_deref())
    .bind(weights_json.as_deref())
    .bind(&id)
    .execute(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    info!(job_id = %id, user_id = %authed.id, "Job updated");

    let job = sqlx::query_as::<_, Job>(&format!("SELECT {} FROM jobs WHERE id = ?", JOB_COLUMNS))
        .bind(&id)
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    Ok(Json(job.into()))
}

/// GET /api/admin/jobs - List all jobs, drafts included
pub async fn admin_list_jobs(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedHr,
) -> Result<Json<JobListResponse>, ApiError> {
    authed.require_admin()?;

    let state = state_lock.read().await.clone();
    let jobs = sqlx::query_as::<_, Job>(&format!(
        "SELECT {} FROM jobs ORDER BY created_at DESC",
        JOB_COLUMNS
    ))
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    let jobs: Vec<JobResponse> = jobs.into_iter().map(Into::into).collect();
    let total = jobs.len();
    Ok(Json(JobListResponse { jobs, total }))
}

/// GET /api/admin/jobs/:id - Fetch a single job, any status
pub async fn admin_get_job(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedHr,
    Path(id): Path<String>,
) -> Result<Json<JobResponse>, ApiError> {
    authed.require_admin()?;

    let state = state_lock.read().await.clone();
    let job = sqlx::query_as::<_, Job>(&format!("SELECT {} FROM jobs WHERE id = ?", JOB_COLUMNS))
        .bind(&id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?
        .ok_or_else(|| ApiError::NotFound("job not found".to_string()))?;

    Ok(Json(job.into()))
}

/// DELETE /api/admin/jobs/:id
pub async fn admin_delete_job(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedHr,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authed.require_admin()?;

    let state = state_lock.read().await.clone();
    let result = sqlx::query("DELETE FROM jobs WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("job not found".to_string()));
    }

    info!(job_id = %id, user_id = %authed.id, "Job deleted");
    Ok(Json(serde_json::json!({ "message": "Job deleted" })))
}
