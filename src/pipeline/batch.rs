// src/pipeline/batch.rs
//! Batch processor: applies one action across a set of application ids,
//! collecting per-item outcomes. An individual failure never aborts the
//! remaining items; invalid top-level parameters abort the whole request
//! before any write.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, warn};

use super::engine::TransitionEngine;
use super::notify::Notification;
use super::stage::{Stage, Status};
use super::{InviteKind, PipelineError};
use crate::common::ApiError;

/// Maximum ids accepted in one bulk request
const MAX_BULK_IDS: usize = 100;

#[derive(Debug, Deserialize)]
pub struct BulkActionRequest {
    pub action: String,
    pub application_ids: Vec<String>,
    #[serde(default)]
    pub data: BulkActionData,
}

/// Action-specific parameters; which fields matter depends on the action
#[derive(Debug, Default, Deserialize)]
pub struct BulkActionData {
    pub status: Option<String>,
    pub target_stage: Option<String>,
    pub send_rejection_email: Option<bool>,
    pub subject: Option<String>,
    pub body: Option<String>,
}

/// Parsed, pre-validated bulk action
#[derive(Debug)]
enum BulkAction {
    UpdateStatus(Status),
    AdvanceStage(Option<Stage>),
    Reject { send_rejection_email: bool },
    SendEmail { subject: String, body: String },
    SendTestInvite,
    SendInterviewInvite,
}

/// Per-item outcome. The write and the notification are accounted for
/// independently: a rejection whose email bounced still counts as written.
#[derive(Debug, Serialize)]
pub struct BulkItemResult {
    pub id: String,
    pub write_succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_succeeded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BulkActionSummary {
    pub success: bool,
    pub success_count: usize,
    pub failed_count: usize,
    pub results: Vec<BulkItemResult>,
}

impl BulkAction {
    /// Parse and pre-validate the request. Anything wrong here is a caller
    /// programming error and fails the whole batch with no writes performed.
    fn parse(request: &BulkActionRequest) -> Result<BulkAction, ApiError> {
        if request.application_ids.is_empty() {
            return Err(ApiError::BulkOperationError(
                "at least one application id is required".to_string(),
            ));
        }
        if request.application_ids.len() > MAX_BULK_IDS {
            return Err(ApiError::BulkOperationError(format!(
                "cannot process more than {} applications at once",
                MAX_BULK_IDS
            )));
        }

        match request.action.as_str() {
            "update_status" => {
                let raw = request.data.status.as_deref().ok_or_else(|| {
                    ApiError::ValidationError("status is required for update_status".to_string())
                })?;
                let status = Status::parse(raw).ok_or_else(|| {
                    ApiError::ValidationError(format!("invalid status '{}'", raw))
                })?;
                Ok(BulkAction::UpdateStatus(status))
            }
            "advance_stage" => {
                let target = match request.data.target_stage.as_deref() {
                    Some(raw) => Some(Stage::parse(raw).ok_or_else(|| {
                        ApiError::ValidationError(format!("invalid target stage '{}'", raw))
                    })?),
                    None => None,
                };
                Ok(BulkAction::AdvanceStage(target))
            }
            "reject" => Ok(BulkAction::Reject {
                send_rejection_email: request.data.send_rejection_email.unwrap_or(false),
            }),
            "send_email" => {
                let subject = request.data.subject.clone().ok_or_else(|| {
                    ApiError::ValidationError("subject is required for send_email".to_string())
                })?;
                let body = request.data.body.clone().ok_or_else(|| {
                    ApiError::ValidationError("body is required for send_email".to_string())
                })?;
                Ok(BulkAction::SendEmail { subject, body })
            }
            "send_test_invite" => Ok(BulkAction::SendTestInvite),
            "send_interview_invite" => Ok(BulkAction::SendInterviewInvite),
            other => Err(ApiError::BulkOperationError(format!(
                "unknown bulk action '{}'",
                other
            ))),
        }
    }
}

/// Apply one bulk action across the target ids, sequentially, recording a
/// per-item outcome for each. Always returns a summary (HTTP success) unless
/// the top-level parameters themselves were invalid.
pub async fn apply_bulk_action(
    engine: &TransitionEngine,
    db: &SqlitePool,
    request: &BulkActionRequest,
    changed_by: &str,
) -> Result<BulkActionSummary, ApiError> {
    let action = BulkAction::parse(request)?;

    let mut results = Vec::with_capacity(request.application_ids.len());

    for application_id in &request.application_ids {
        let result = match &action {
            BulkAction::UpdateStatus(status) => {
                apply_status_update(db, application_id, *status, changed_by).await
            }
            BulkAction::AdvanceStage(target) => {
                match engine.advance(application_id, *target, changed_by).await {
                    Ok(_) => BulkItemResult {
                        id: application_id.clone(),
                        write_succeeded: true,
                        notify_succeeded: None,
                        error: None,
                    },
                    Err(e) => item_failure(application_id, e),
                }
            }
            BulkAction::Reject {
                send_rejection_email,
            } => apply_reject(engine, db, application_id, *send_rejection_email, changed_by).await,
            BulkAction::SendEmail { subject, body } => {
                apply_custom_email(engine, db, application_id, subject, body).await
            }
            BulkAction::SendTestInvite => {
                apply_invite(engine, application_id, InviteKind::Test).await
            }
            BulkAction::SendInterviewInvite => {
                apply_invite(engine, application_id, InviteKind::Interview).await
            }
        };
        results.push(result);
    }

    let success_count = results
        .iter()
        .filter(|r| r.error.is_none())
        .count();
    let failed_count = results.len() - success_count;

    info!(
        action = %request.action,
        success_count = success_count,
        failed_count = failed_count,
        "Bulk action completed"
    );

    Ok(BulkActionSummary {
        success: failed_count == 0,
        success_count,
        failed_count,
        results,
    })
}

fn item_failure(application_id: &str, error: PipelineError) -> BulkItemResult {
    BulkItemResult {
        id: application_id.to_string(),
        write_succeeded: false,
        notify_succeeded: None,
        error: Some(error.to_string()),
    }
}

/// Raw status update, keeping the status/current_stage invariant: the
/// terminal statuses drag the stage with them, and a non-terminal status on
/// a terminal-stage application is a per-item error rather than a silent
/// resurrection.
async fn apply_status_update(
    db: &SqlitePool,
    application_id: &str,
    status: Status,
    changed_by: &str,
) -> BulkItemResult {
    let result = async {
        let current_stage: String =
            sqlx::query_scalar("SELECT current_stage FROM applications WHERE id = ?")
                .bind(application_id)
                .fetch_optional(db)
                .await?
                .ok_or_else(|| PipelineError::NotFound(application_id.to_string()))?;
        let current = Stage::parse(&current_stage).unwrap_or(Stage::ResumeScreening);

        let new_stage = match status {
            Status::Rejected => Stage::Rejected,
            Status::Hired => Stage::Hired,
            _ => {
                if current.is_terminal() {
                    return Err(PipelineError::AlreadyAtFinalStage(current));
                }
                current
            }
        };

        sqlx::query(
            "UPDATE applications SET status = ?, current_stage = ?, updated_at = datetime('now') WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(new_stage.as_str())
        .bind(application_id)
        .execute(db)
        .await?;

        let history_id = crate::common::generate_history_id();
        sqlx::query(
            r#"
            INSERT INTO application_stage_history (id, application_id, stage, status, changed_by, notes, changed_at)
            VALUES (?, ?, ?, ?, ?, 'Bulk status update', datetime('now'))
            "#,
        )
        .bind(&history_id)
        .bind(application_id)
        .bind(new_stage.as_str())
        .bind(status.as_str())
        .bind(changed_by)
        .execute(db)
        .await?;

        Ok::<(), PipelineError>(())
    }
    .await;

    match result {
        Ok(()) => BulkItemResult {
            id: application_id.to_string(),
            write_succeeded: true,
            notify_succeeded: None,
            error: None,
        },
        Err(e) => item_failure(application_id, e),
    }
}

async fn apply_reject(
    engine: &TransitionEngine,
    db: &SqlitePool,
    application_id: &str,
    send_rejection_email: bool,
    changed_by: &str,
) -> BulkItemResult {
    match engine.reject(application_id, changed_by).await {
        Ok(_) => {
            let mut notify_succeeded = None;
            if send_rejection_email {
                notify_succeeded = Some(
                    send_notification(engine, db, application_id, &Notification::Rejection).await,
                );
            }
            BulkItemResult {
                id: application_id.to_string(),
                write_succeeded: true,
                notify_succeeded,
                error: None,
            }
        }
        Err(e) => item_failure(application_id, e),
    }
}

async fn apply_custom_email(
    engine: &TransitionEngine,
    db: &SqlitePool,
    application_id: &str,
    subject: &str,
    body: &str,
) -> BulkItemResult {
    let notification = Notification::Custom {
        subject: subject.to_string(),
        body: body.to_string(),
    };
    let sent = send_notification(engine, db, application_id, &notification).await;
    BulkItemResult {
        id: application_id.to_string(),
        // send_email performs no application write
        write_succeeded: false,
        notify_succeeded: Some(sent),
        error: if sent {
            None
        } else {
            Some("email delivery failed".to_string())
        },
    }
}

async fn apply_invite(
    engine: &TransitionEngine,
    application_id: &str,
    kind: InviteKind,
) -> BulkItemResult {
    match engine.send_stage_invite(application_id, kind).await {
        Ok(outcome) => BulkItemResult {
            id: application_id.to_string(),
            write_succeeded: true,
            notify_succeeded: Some(outcome.notify_succeeded),
            error: None,
        },
        Err(e) => item_failure(application_id, e),
    }
}

/// Look up the candidate and job title, then dispatch. Returns whether the
/// email went out; failures are logged and folded into the item result.
async fn send_notification(
    engine: &TransitionEngine,
    db: &SqlitePool,
    application_id: &str,
    notification: &Notification,
) -> bool {
    let recipient = sqlx::query_as::<_, (String, String, String)>(
        r#"
        SELECT a.name, a.email, j.title
        FROM applications a JOIN jobs j ON a.job_id = j.id
        WHERE a.id = ?
        "#,
    )
    .bind(application_id)
    .fetch_optional(db)
    .await;

    let (name, email, job_title) = match recipient {
        Ok(Some(row)) => row,
        Ok(None) => {
            warn!(application_id = %application_id, "Notification skipped: application not found");
            return false;
        }
        Err(e) => {
            warn!(application_id = %application_id, error = %e, "Notification skipped: lookup failed");
            return false;
        }
    };

    engine
        .dispatcher()
        .send(application_id, &email, notification, &name, &job_title)
        .await
        .is_ok()
}
