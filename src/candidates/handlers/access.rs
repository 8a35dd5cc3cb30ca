// src/candidates/handlers/access.rs
//
// Token-gated candidate endpoints. No account exists; whoever holds the
// capability token is the candidate. Tokens are single-purpose and the
// submission endpoints consume them (a second submit is a conflict).

use axum::extract::{Extension, Json, Path};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::candidates::models::*;
use crate::candidates::validators::{AsyncInterviewValidator, McqSubmissionValidator};
use crate::common::{safe_token_log, ApiError, AppState, Validator};
use crate::pipeline::engine::TransitionEngine;
use crate::pipeline::stage::Stage;

async fn fetch_by_token(
    state: &AppState,
    column: &str,
    token: &str,
) -> Result<Application, ApiError> {
    // column is a compile-time constant, never user input
    let query = format!("SELECT * FROM applications WHERE {} = ?", column);
    sqlx::query_as::<_, Application>(&query)
        .bind(token)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?
        .ok_or_else(|| ApiError::NotFound("invalid or expired link".to_string()))
}

async fn job_title(state: &AppState, job_id: &str) -> Result<String, ApiError> {
    sqlx::query_scalar("SELECT title FROM jobs WHERE id = ?")
        .bind(job_id)
        .fetch_optional(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?
        .ok_or_else(|| ApiError::NotFound("job not found".to_string()))
}

/// GET /api/candidate/test/:token - Render data for the MCQ test page
pub async fn get_test_by_token(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(token): Path<String>,
) -> Result<Json<CandidateAccessResponse>, ApiError> {
    let state = state_lock.read().await.clone();
    let application = fetch_by_token(&state, "test_token", &token).await?;
    let job_title = job_title(&state, &application.job_id).await?;

    Ok(Json(CandidateAccessResponse {
        candidate_name: application.name,
        job_title,
        already_submitted: application.mcq_submitted_at.is_some(),
    }))
}

/// POST /api/candidate/test/:token - Submit MCQ results
///
/// The percentage is derived server-side from the counts; the raw score
/// flows through the engine so overall-score recomputation and auto-advance
/// apply the same as any other score write.
pub async fn submit_test_by_token(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(token): Path<String>,
    Json(submission): Json<McqSubmission>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let validation = McqSubmissionValidator.validate(&submission);
    if !validation.is_valid {
        return Err(validation.into());
    }

    let state = state_lock.read().await.clone();
    let application = fetch_by_token(&state, "test_token", &token).await?;

    if application.mcq_submitted_at.is_some() {
        return Err(ApiError::Conflict(
            "this test was already submitted".to_string(),
        ));
    }

    let score = (submission.correct_answers as f64 / submission.total_questions as f64) * 100.0;

    // Mark consumed before recording; a concurrent duplicate submit loses
    // the conditional update and conflicts
    let result = sqlx::query(
        r#"UPDATE applications
           SET mcq_submitted_at = datetime('now'), updated_at = datetime('now')
           WHERE id = ? AND mcq_submitted_at IS NULL"#,
    )
    .bind(&application.id)
    .execute(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::Conflict(
            "this test was already submitted".to_string(),
        ));
    }

    let engine = TransitionEngine::from_state(&state);
    let outcome = engine
        .record_stage_score(&application.id, Stage::McqTest, score, "candidate")
        .await?;

    info!(
        application_id = %application.id,
        token = %safe_token_log(&token),
        score = score,
        "MCQ test submitted"
    );

    Ok(Json(serde_json::json!({
        "score": outcome.score,
        "auto_advanced": outcome.auto_advanced.is_some(),
    })))
}

/// GET /api/candidate/interview/:token - Render data for the interview page
pub async fn get_interview_by_token(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(token): Path<String>,
) -> Result<Json<CandidateAccessResponse>, ApiError> {
    let state = state_lock.read().await.clone();
    let application = fetch_by_token(&state, "interview_token", &token).await?;
    let job_title = job_title(&state, &application.job_id).await?;

    Ok(Json(CandidateAccessResponse {
        candidate_name: application.name,
        job_title,
        already_submitted: application.async_interview_submitted_at.is_some(),
    }))
}

/// POST /api/candidate/interview/:token - Submit async interview responses
///
/// Responses are stored for HR review; the interview score is recorded
/// later through the admin scoring endpoint.
pub async fn submit_interview_by_token(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Path(token): Path<String>,
    Json(submission): Json<AsyncInterviewSubmission>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let validation = AsyncInterviewValidator.validate(&submission);
    if !validation.is_valid {
        return Err(validation.into());
    }

    let state = state_lock.read().await.clone();
    let application = fetch_by_token(&state, "interview_token", &token).await?;

    if application.async_interview_submitted_at.is_some() {
        return Err(ApiError::Conflict(
            "this interview was already submitted".to_string(),
        ));
    }

    let responses_json = serde_json::to_string(&submission.responses)
        .map_err(|e| ApiError::InternalServer(e.to_string()))?;

    let result = sqlx::query(
        r#"UPDATE applications
           SET async_interview_responses = ?,
               async_interview_submitted_at = datetime('now'),
               updated_at = datetime('now')
           WHERE id = ? AND async_interview_submitted_at IS NULL"#,
    )
    .bind(&responses_json)
    .bind(&application.id)
    .execute(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::Conflict(
            "this interview was already submitted".to_string(),
        ));
    }

    info!(
        application_id = %application.id,
        token = %safe_token_log(&token),
        responses = submission.responses.len(),
        "Async interview submitted"
    );

    Ok(Json(serde_json::json!({ "message": "Interview submitted" })))
}
