// src/candidates/handlers/applications.rs

use axum::extract::{Extension, Json, Path};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::auth::AuthedHr;
use crate::candidates::models::*;
use crate::candidates::validators::ApplicationValidator;
use crate::common::{generate_application_id, safe_email_log, ApiError, AppState, Validator};
use crate::pipeline::engine::TransitionEngine;
use crate::pipeline::stage::Stage;
use crate::pipeline::InviteKind;

/// POST /api/jobs/:id/apply - Public application submission
///
/// The write always lands first; AI resume scoring runs afterwards and a
/// scorer outage never loses a submission.
pub async fn submit_application(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(job_id): Path<String>,
    Json(request): Json<SubmitApplicationRequest>,
) -> Result<Json<ApplicationResponse>, ApiError> {
    let validation = ApplicationValidator.validate(&request);
    if !validation.is_valid {
        return Err(validation.into());
    }

    let state = state_lock.read().await.clone();

    let job_status: Option<String> =
        sqlx::query_scalar("SELECT status FROM jobs WHERE id = ?")
            .bind(&job_id)
            .fetch_optional(&state.db)
            .await
            .map_err(ApiError::DatabaseError)?;

    match job_status.as_deref() {
        None => return Err(ApiError::NotFound("job not found".to_string())),
        Some("active") => {}
        Some(_) => {
            return Err(ApiError::BadRequest(
                "this job is not accepting applications".to_string(),
            ))
        }
    }

    let email = request.email.trim().to_lowercase();

    let existing: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM applications WHERE job_id = ? AND email = ?",
    )
    .bind(&job_id)
    .bind(&email)
    .fetch_one(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    if existing > 0 {
        return Err(ApiError::Conflict(
            "an application for this job already exists for this email".to_string(),
        ));
    }

    let id = generate_application_id();
    let skills_json = request
        .skills
        .as_ref()
        .map(|s| serde_json::to_string(s).unwrap_or_else(|_| "[]".to_string()));

    sqlx::query(
        r#"INSERT INTO applications (
            id, job_id, name, email, phone, resume_text, skills,
            years_experience, cover_letter
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(&job_id)
    .bind(request.name.trim())
    .bind(&email)
    .bind(request.phone.as_deref())
    .bind(request.resume_text.as_deref())
    .bind(skills_json.as_deref())
    .bind(request.years_experience)
    .bind(request.cover_letter.as_deref())
    .execute(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    info!(
        application_id = %id,
        job_id = %job_id,
        email = %safe_email_log(&email),
        "Application submitted"
    );

    if request.resume_text.is_some() {
        if let Err(e) = analyze_resume(&state, &id).await {
            warn!(
                application_id = %id,
                error = %e,
                "Resume analysis unavailable, submission kept"
            );
        }
    }

    let application = fetch_application(&state, &id).await?;
    Ok(Json(application.into()))
}

/// GET /api/admin/jobs/:id/applications
pub async fn admin_list_applications(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedHr,
    Path(job_id): Path<String>,
) -> Result<Json<Vec<ApplicationResponse>>, ApiError> {
    authed.require_admin()?;
    let state = state_lock.read().await.clone();

    let applications = sqlx::query_as::<_, Application>(
        "SELECT * FROM applications WHERE job_id = ? ORDER BY overall_score DESC NULLS LAST, created_at DESC",
    )
    .bind(&job_id)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    Ok(Json(applications.into_iter().map(Into::into).collect()))
}

/// GET /api/admin/applications/:id - Application detail with stage history
pub async fn admin_get_application(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedHr,
    Path(id): Path<String>,
) -> Result<Json<ApplicationDetailResponse>, ApiError> {
    authed.require_admin()?;
    let state = state_lock.read().await.clone();

    let application = fetch_application(&state, &id).await?;

    let stage_history = sqlx::query_as::<_, StageHistoryEntry>(
        r#"SELECT id, stage, status, changed_by, notes, changed_at
           FROM application_stage_history
           WHERE application_id = ?
           ORDER BY changed_at ASC, id ASC"#,
    )
    .bind(&id)
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    Ok(Json(ApplicationDetailResponse {
        application: application.into(),
        stage_history,
    }))
}

/// POST /api/admin/applications/:id/advance
pub async fn admin_advance_application(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedHr,
    Path(id): Path<String>,
    Json(body): Json<AdvanceStageRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authed.require_admin()?;
    let state = state_lock.read().await.clone();

    let target = match body.target_stage.as_deref() {
        Some(raw) => Some(
            Stage::parse(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("unknown stage '{}'", raw)))?,
        ),
        None => None,
    };

    let engine = TransitionEngine::from_state(&state);
    let change = engine.advance(&id, target, &authed.email).await?;

    Ok(Json(serde_json::json!({
        "application_id": id,
        "current_stage": change.stage.as_str(),
        "status": change.status.as_str(),
    })))
}

/// POST /api/admin/applications/:id/reject
pub async fn admin_reject_application(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedHr,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authed.require_admin()?;
    let state = state_lock.read().await.clone();

    let engine = TransitionEngine::from_state(&state);
    let change = engine.reject(&id, &authed.email).await?;

    Ok(Json(serde_json::json!({
        "application_id": id,
        "current_stage": change.stage.as_str(),
        "status": change.status.as_str(),
    })))
}

/// POST /api/admin/applications/:id/invite - Issue a test or interview invite
pub async fn admin_invite_application(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedHr,
    Path(id): Path<String>,
    Json(body): Json<InviteRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authed.require_admin()?;
    let state = state_lock.read().await.clone();

    let kind = InviteKind::parse(&body.kind)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown invite kind '{}'", body.kind)))?;

    let engine = TransitionEngine::from_state(&state);
    let outcome = engine.send_stage_invite(&id, kind).await?;

    Ok(Json(serde_json::json!({
        "application_id": id,
        "kind": kind.as_str(),
        "notify_succeeded": outcome.notify_succeeded,
    })))
}

/// POST /api/admin/applications/:id/score - Record a stage score manually
pub async fn admin_record_score(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedHr,
    Path(id): Path<String>,
    Json(body): Json<RecordScoreRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authed.require_admin()?;
    let state = state_lock.read().await.clone();

    let stage = Stage::parse(&body.stage)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown stage '{}'", body.stage)))?;

    let engine = TransitionEngine::from_state(&state);
    let outcome = engine
        .record_stage_score(&id, stage, body.score, &authed.email)
        .await?;

    Ok(Json(serde_json::json!({
        "application_id": id,
        "stage": outcome.stage.as_str(),
        "score": outcome.score,
        "overall_score": outcome.overall_score,
        "auto_advanced": outcome.auto_advanced.map(|c| c.stage.as_str()),
    })))
}

/// POST /api/admin/applications/:id/reanalyze - Re-run AI resume scoring
pub async fn admin_reanalyze_application(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedHr,
    Path(id): Path<String>,
) -> Result<Json<ApplicationResponse>, ApiError> {
    authed.require_admin()?;
    let state = state_lock.read().await.clone();

    analyze_resume(&state, &id).await?;

    let application = fetch_application(&state, &id).await?;
    Ok(Json(application.into()))
}

/// GET /api/admin/pipeline/analytics - Funnel counts for the dashboard
pub async fn admin_pipeline_analytics(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedHr,
) -> Result<Json<PipelineAnalytics>, ApiError> {
    authed.require_admin()?;
    let state = state_lock.read().await.clone();

    let total_applications: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications")
        .fetch_one(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    let by_stage = sqlx::query_as::<_, StageCount>(
        "SELECT current_stage, COUNT(*) as count FROM applications GROUP BY current_stage",
    )
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    let by_status = sqlx::query_as::<_, StatusCount>(
        "SELECT status, COUNT(*) as count FROM applications GROUP BY status",
    )
    .fetch_all(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    let average_overall_score: Option<f64> =
        sqlx::query_scalar("SELECT AVG(overall_score) FROM applications")
            .fetch_one(&state.db)
            .await
            .map_err(ApiError::DatabaseError)?;

    let hired_count = by_status
        .iter()
        .find(|s| s.status == "hired")
        .map_or(0, |s| s.count);
    let rejected_count = by_status
        .iter()
        .find(|s| s.status == "rejected")
        .map_or(0, |s| s.count);

    Ok(Json(PipelineAnalytics {
        total_applications,
        by_stage,
        by_status,
        average_overall_score,
        hired_count,
        rejected_count,
    }))
}

// ---- Helper Functions ----

pub(crate) async fn fetch_application(
    state: &AppState,
    id: &str,
) -> Result<Application, ApiError> {
    // Malformed ids skip the lookup entirely
    if !crate::common::is_valid_entity_id(id) {
        return Err(ApiError::NotFound("application not found".to_string()));
    }
    sqlx::query_as::<_, Application>("SELECT * FROM applications WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?
        .ok_or_else(|| ApiError::NotFound("application not found".to_string()))
}

/// Score the resume against the job's requirements, persist the analysis and
/// record the resume stage score through the engine (which also recomputes
/// the overall score and applies auto-advance).
async fn analyze_resume(state: &AppState, application_id: &str) -> Result<(), ApiError> {
    let application = fetch_application(state, application_id).await?;

    let resume_text = application
        .resume_text
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("application has no resume text".to_string()))?;

    let (job_title, requirements_json): (String, Option<String>) =
        sqlx::query_as("SELECT title, requirements FROM jobs WHERE id = ?")
            .bind(&application.job_id)
            .fetch_one(&state.db)
            .await
            .map_err(ApiError::DatabaseError)?;

    let requirements: Vec<String> = requirements_json
        .as_deref()
        .and_then(|r| serde_json::from_str(r).ok())
        .unwrap_or_default();

    let analysis = state
        .openai_service
        .score_resume(resume_text, &job_title, &requirements)
        .await
        .map_err(|e| ApiError::ExternalServiceError(e.to_string()))?;

    let analysis_json = serde_json::to_string(&analysis)
        .map_err(|e| ApiError::InternalServer(e.to_string()))?;

    sqlx::query(
        "UPDATE applications SET resume_analysis = ?, updated_at = datetime('now') WHERE id = ?",
    )
    .bind(&analysis_json)
    .bind(application_id)
    .execute(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    let engine = TransitionEngine::from_state(state);
    engine
        .record_stage_score(
            application_id,
            Stage::ResumeScreening,
            analysis.score,
            "system",
        )
        .await?;

    Ok(())
}
