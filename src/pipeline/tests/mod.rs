// src/pipeline/tests/mod.rs
//! Engine and batch processor tests against an in-memory SQLite database.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::common::migrations;
use crate::pipeline::batch::{apply_bulk_action, BulkActionData, BulkActionRequest};
use crate::pipeline::engine::TransitionEngine;
use crate::pipeline::notify::NotificationDispatcher;
use crate::pipeline::stage::{Stage, Status};
use crate::pipeline::{InviteKind, PipelineError};
use crate::services::{AwsService, SettingsService};

async fn setup() -> (SqlitePool, TransitionEngine) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    migrations::run_migrations(&pool).await.expect("migrations");

    let settings = Arc::new(SettingsService::new(pool.clone()));
    // SES is unconfigured in tests: sends fail, which exercises the
    // best-effort notify path
    let aws = Arc::new(AwsService::new(settings));
    let engine = TransitionEngine::new(
        pool.clone(),
        NotificationDispatcher::new(aws),
        "http://localhost:3000".to_string(),
    );
    (pool, engine)
}

async fn insert_job(pool: &SqlitePool, id: &str) {
    sqlx::query(
        r#"
        INSERT INTO jobs (id, title, status, scoring_weights)
        VALUES (?, 'Backend Engineer', 'active', ?)
        "#,
    )
    .bind(id)
    .bind(r#"{"resume":0.4,"mcq":0.3,"async_interview":0.2,"live_interview":0.1}"#)
    .execute(pool)
    .await
    .expect("insert job");
}

async fn insert_application(pool: &SqlitePool, id: &str, job_id: &str, stage: Stage) {
    sqlx::query(
        r#"
        INSERT INTO applications (id, job_id, name, email, status, current_stage)
        VALUES (?, ?, 'Test Candidate', ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(job_id)
    .bind(format!("{}@example.com", id.to_lowercase()))
    .bind(if stage.is_terminal() {
        stage.as_str()
    } else {
        "in_progress"
    })
    .bind(stage.as_str())
    .execute(pool)
    .await
    .expect("insert application");
}

async fn fetch_stage_status(pool: &SqlitePool, id: &str) -> (String, String) {
    sqlx::query_as("SELECT current_stage, status FROM applications WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
        .expect("fetch application")
}

#[tokio::test]
async fn test_advance_moves_to_next_stage() {
    let (pool, engine) = setup().await;
    insert_job(&pool, "J_TEST01").await;
    insert_application(&pool, "A_ONE", "J_TEST01", Stage::ResumeScreening).await;

    let change = engine.advance("A_ONE", None, "U_ADMIN").await.unwrap();
    assert_eq!(change.stage, Stage::McqTest);
    assert_eq!(change.status, Status::InProgress);

    let (stage, status) = fetch_stage_status(&pool, "A_ONE").await;
    assert_eq!(stage, "mcq_test");
    assert_eq!(status, "in_progress");
}

#[tokio::test]
async fn test_advance_from_offer_without_target_fails() {
    let (pool, engine) = setup().await;
    insert_job(&pool, "J_TEST01").await;
    insert_application(&pool, "A_ONE", "J_TEST01", Stage::Offer).await;

    let err = engine.advance("A_ONE", None, "U_ADMIN").await.unwrap_err();
    assert!(matches!(err, PipelineError::AlreadyAtFinalStage(Stage::Offer)));
}

#[tokio::test]
async fn test_explicit_hire_from_offer() {
    let (pool, engine) = setup().await;
    insert_job(&pool, "J_TEST01").await;
    insert_application(&pool, "A_ONE", "J_TEST01", Stage::Offer).await;

    let change = engine
        .advance("A_ONE", Some(Stage::Hired), "U_ADMIN")
        .await
        .unwrap();
    assert_eq!(change.status, Status::Hired);

    let (stage, status) = fetch_stage_status(&pool, "A_ONE").await;
    assert_eq!(stage, "hired");
    assert_eq!(status, "hired");
}

#[tokio::test]
async fn test_advance_records_stage_history() {
    let (pool, engine) = setup().await;
    insert_job(&pool, "J_TEST01").await;
    insert_application(&pool, "A_ONE", "J_TEST01", Stage::ResumeScreening).await;

    engine.advance("A_ONE", None, "U_ADMIN").await.unwrap();

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM application_stage_history WHERE application_id = 'A_ONE'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_reject_is_idempotent() {
    let (pool, engine) = setup().await;
    insert_job(&pool, "J_TEST01").await;
    insert_application(&pool, "A_ONE", "J_TEST01", Stage::McqTest).await;

    let first = engine.reject("A_ONE", "U_ADMIN").await.unwrap();
    assert_eq!(first.stage, Stage::Rejected);
    assert_eq!(first.status, Status::Rejected);

    // Second rejection is a no-op success
    let second = engine.reject("A_ONE", "U_ADMIN").await.unwrap();
    assert_eq!(second.stage, Stage::Rejected);

    let (stage, status) = fetch_stage_status(&pool, "A_ONE").await;
    assert_eq!(stage, "rejected");
    assert_eq!(status, "rejected");

    // Only the first rejection wrote history
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM application_stage_history WHERE application_id = 'A_ONE'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_invite_token_issued_once() {
    let (pool, engine) = setup().await;
    insert_job(&pool, "J_TEST01").await;
    insert_application(&pool, "A_ONE", "J_TEST01", Stage::McqTest).await;

    let outcome = engine
        .send_stage_invite("A_ONE", InviteKind::Test)
        .await
        .unwrap();
    assert_eq!(outcome.token.len(), 22);
    // SES is unconfigured: the token write stands even though the email failed
    assert!(!outcome.notify_succeeded);

    let stored: Option<String> =
        sqlx::query_scalar("SELECT test_token FROM applications WHERE id = 'A_ONE'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(stored.as_deref(), Some(outcome.token.as_str()));

    // Second invite fails and leaves the token unchanged
    let err = engine
        .send_stage_invite("A_ONE", InviteKind::Test)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::AlreadyInvited("test")));

    let after: Option<String> =
        sqlx::query_scalar("SELECT test_token FROM applications WHERE id = 'A_ONE'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(after, stored);
}

#[tokio::test]
async fn test_test_and_interview_tokens_are_independent() {
    let (pool, engine) = setup().await;
    insert_job(&pool, "J_TEST01").await;
    insert_application(&pool, "A_ONE", "J_TEST01", Stage::AsyncInterview).await;

    engine
        .send_stage_invite("A_ONE", InviteKind::Test)
        .await
        .unwrap();
    // A test invite does not block the interview invite
    engine
        .send_stage_invite("A_ONE", InviteKind::Interview)
        .await
        .unwrap();

    let (test_token, interview_token): (Option<String>, Option<String>) = sqlx::query_as(
        "SELECT test_token, interview_token FROM applications WHERE id = 'A_ONE'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert!(test_token.is_some());
    assert!(interview_token.is_some());
    assert_ne!(test_token, interview_token);
}

#[tokio::test]
async fn test_record_score_recomputes_overall_renormalized() {
    let (pool, engine) = setup().await;
    insert_job(&pool, "J_TEST01").await;
    insert_application(&pool, "A_ONE", "J_TEST01", Stage::ResumeScreening).await;

    let outcome = engine
        .record_stage_score("A_ONE", Stage::ResumeScreening, 80.0, "system")
        .await
        .unwrap();
    // Only the resume score is present: re-normalized overall equals it
    assert_eq!(outcome.overall_score, Some(80.0));

    let overall: Option<f64> =
        sqlx::query_scalar("SELECT overall_score FROM applications WHERE id = 'A_ONE'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(overall, Some(80.0));
}

#[tokio::test]
async fn test_record_score_rejects_out_of_range() {
    let (pool, engine) = setup().await;
    insert_job(&pool, "J_TEST01").await;
    insert_application(&pool, "A_ONE", "J_TEST01", Stage::McqTest).await;

    let err = engine
        .record_stage_score("A_ONE", Stage::McqTest, 140.0, "system")
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::InvalidScore(_)));
}

#[tokio::test]
async fn test_auto_advance_on_threshold() {
    let (pool, engine) = setup().await;
    sqlx::query(
        r#"
        INSERT INTO jobs (id, title, status, scoring_weights, auto_advance_thresholds)
        VALUES ('J_AUTO', 'Backend Engineer', 'active',
                '{"resume":0.4,"mcq":0.3,"async_interview":0.2,"live_interview":0.1}',
                '{"resume_screening":70.0}')
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();
    insert_application(&pool, "A_ONE", "J_AUTO", Stage::ResumeScreening).await;
    insert_application(&pool, "A_TWO", "J_AUTO", Stage::ResumeScreening).await;

    // Above threshold: advanced automatically
    let outcome = engine
        .record_stage_score("A_ONE", Stage::ResumeScreening, 85.0, "system")
        .await
        .unwrap();
    assert_eq!(outcome.auto_advanced.unwrap().stage, Stage::McqTest);

    // Below threshold: stays put
    let outcome = engine
        .record_stage_score("A_TWO", Stage::ResumeScreening, 50.0, "system")
        .await
        .unwrap();
    assert!(outcome.auto_advanced.is_none());
    let (stage, _) = fetch_stage_status(&pool, "A_TWO").await;
    assert_eq!(stage, "resume_screening");
}

// ============================================================================
// Batch processor
// ============================================================================

fn bulk_request(action: &str, ids: &[&str], data: BulkActionData) -> BulkActionRequest {
    BulkActionRequest {
        action: action.to_string(),
        application_ids: ids.iter().map(|s| s.to_string()).collect(),
        data,
    }
}

#[tokio::test]
async fn test_bulk_invalid_status_aborts_before_any_write() {
    let (pool, engine) = setup().await;
    insert_job(&pool, "J_TEST01").await;
    insert_application(&pool, "A_ONE", "J_TEST01", Stage::ResumeScreening).await;

    let request = bulk_request(
        "update_status",
        &["A_ONE"],
        BulkActionData {
            status: Some("bogus".to_string()),
            ..Default::default()
        },
    );
    let err = apply_bulk_action(&engine, &pool, &request, "U_ADMIN").await;
    assert!(err.is_err());

    // Nothing was written
    let (_, status) = fetch_stage_status(&pool, "A_ONE").await;
    assert_eq!(status, "in_progress");
}

#[tokio::test]
async fn test_bulk_unknown_action_rejected() {
    let (pool, engine) = setup().await;
    let request = bulk_request("make_coffee", &["A_ONE"], BulkActionData::default());
    assert!(apply_bulk_action(&engine, &pool, &request, "U_ADMIN")
        .await
        .is_err());
}

#[tokio::test]
async fn test_bulk_advance_partial_failure() {
    let (pool, engine) = setup().await;
    insert_job(&pool, "J_TEST01").await;
    for id in ["A_ONE", "A_TWO", "A_THREE", "A_FOUR"] {
        insert_application(&pool, id, "J_TEST01", Stage::ResumeScreening).await;
    }
    // A_GHOST does not exist; its failure must not abort the others

    let request = bulk_request(
        "advance_stage",
        &["A_ONE", "A_TWO", "A_GHOST", "A_THREE", "A_FOUR"],
        BulkActionData::default(),
    );
    let summary = apply_bulk_action(&engine, &pool, &request, "U_ADMIN")
        .await
        .unwrap();

    assert_eq!(summary.success_count, 4);
    assert_eq!(summary.failed_count, 1);
    assert!(!summary.success);

    let ghost = summary.results.iter().find(|r| r.id == "A_GHOST").unwrap();
    assert!(!ghost.write_succeeded);
    assert!(ghost.error.is_some());

    // The four real applications verifiably advanced
    for id in ["A_ONE", "A_TWO", "A_THREE", "A_FOUR"] {
        let (stage, _) = fetch_stage_status(&pool, id).await;
        assert_eq!(stage, "mcq_test");
    }
}

#[tokio::test]
async fn test_bulk_reject_with_email_keeps_write_on_send_failure() {
    let (pool, engine) = setup().await;
    insert_job(&pool, "J_TEST01").await;
    insert_application(&pool, "A_ONE", "J_TEST01", Stage::McqTest).await;

    let request = bulk_request(
        "reject",
        &["A_ONE"],
        BulkActionData {
            send_rejection_email: Some(true),
            ..Default::default()
        },
    );
    let summary = apply_bulk_action(&engine, &pool, &request, "U_ADMIN")
        .await
        .unwrap();

    assert_eq!(summary.success_count, 1);
    let item = &summary.results[0];
    assert!(item.write_succeeded);
    // SES is unconfigured: notify failed, write stands
    assert_eq!(item.notify_succeeded, Some(false));

    let (stage, status) = fetch_stage_status(&pool, "A_ONE").await;
    assert_eq!(stage, "rejected");
    assert_eq!(status, "rejected");
}

#[tokio::test]
async fn test_bulk_update_status_terminal_drags_stage() {
    let (pool, engine) = setup().await;
    insert_job(&pool, "J_TEST01").await;
    insert_application(&pool, "A_ONE", "J_TEST01", Stage::AsyncInterview).await;

    let request = bulk_request(
        "update_status",
        &["A_ONE"],
        BulkActionData {
            status: Some("rejected".to_string()),
            ..Default::default()
        },
    );
    let summary = apply_bulk_action(&engine, &pool, &request, "U_ADMIN")
        .await
        .unwrap();
    assert_eq!(summary.success_count, 1);

    // status == rejected implies current_stage == rejected
    let (stage, status) = fetch_stage_status(&pool, "A_ONE").await;
    assert_eq!(stage, "rejected");
    assert_eq!(status, "rejected");
}

#[tokio::test]
async fn test_bulk_update_status_cannot_resurrect_terminal() {
    let (pool, engine) = setup().await;
    insert_job(&pool, "J_TEST01").await;
    insert_application(&pool, "A_ONE", "J_TEST01", Stage::Rejected).await;

    let request = bulk_request(
        "update_status",
        &["A_ONE"],
        BulkActionData {
            status: Some("pending".to_string()),
            ..Default::default()
        },
    );
    let summary = apply_bulk_action(&engine, &pool, &request, "U_ADMIN")
        .await
        .unwrap();
    assert_eq!(summary.failed_count, 1);
    assert!(summary.results[0].error.is_some());

    // The terminal pair stays intact
    let (stage, status) = fetch_stage_status(&pool, "A_ONE").await;
    assert_eq!(stage, "rejected");
    assert_eq!(status, "rejected");
}

#[tokio::test]
async fn test_bulk_empty_ids_rejected() {
    let (pool, engine) = setup().await;
    let request = bulk_request("reject", &[], BulkActionData::default());
    assert!(apply_bulk_action(&engine, &pool, &request, "U_ADMIN")
        .await
        .is_err());
}
