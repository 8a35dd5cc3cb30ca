// src/pipeline/engine.rs
//! Transition engine: single-application stage moves, rejection, invite
//! tokens, and per-stage score recording. Persists through sqlx and appends
//! every change to the stage history table.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use tracing::{info, warn};

use super::config::PipelineConfig;
use super::notify::{invite_link, Notification, NotificationDispatcher};
use super::scoring::{compute_overall_score, is_valid_score, StageScores};
use super::stage::{status_for_stage, validate_transition, Stage, Status};
use super::{InviteKind, PipelineError};
use crate::common::{generate_history_id, AppState};

/// Outcome of a stage transition
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StageChange {
    pub stage: Stage,
    pub status: Status,
}

/// Outcome of an invite issue: the token was persisted exactly once; the
/// email may still have failed (best-effort notify).
#[derive(Debug, Serialize)]
pub struct InviteOutcome {
    pub token: String,
    pub notify_succeeded: bool,
}

/// Outcome of recording a per-stage score
#[derive(Debug, Serialize)]
pub struct ScoreOutcome {
    pub stage: Stage,
    pub score: f64,
    pub overall_score: Option<f64>,
    /// Set when the job's auto-advance threshold was met
    pub auto_advanced: Option<StageChange>,
}

/// Minimal application projection the engine works with
#[derive(Debug, FromRow)]
struct EngineRow {
    id: String,
    job_id: String,
    name: String,
    email: String,
    current_stage: String,
    resume_score: Option<f64>,
    mcq_score: Option<f64>,
    async_interview_score: Option<f64>,
    live_interview_score: Option<f64>,
    test_token: Option<String>,
    interview_token: Option<String>,
}

#[derive(Debug, FromRow)]
struct JobRow {
    title: String,
    enabled_stages: Option<String>,
    auto_advance_thresholds: Option<String>,
    scoring_weights: Option<String>,
}

impl EngineRow {
    fn stage(&self) -> Stage {
        // Lenient on legacy rows, same as the status_to_stage fallback used
        // before the enum existed
        Stage::parse(&self.current_stage).unwrap_or(Stage::ResumeScreening)
    }

    fn scores(&self) -> StageScores {
        StageScores {
            resume: self.resume_score,
            mcq: self.mcq_score,
            async_interview: self.async_interview_score,
            live_interview: self.live_interview_score,
        }
    }
}

#[derive(Clone)]
pub struct TransitionEngine {
    db: SqlitePool,
    dispatcher: NotificationDispatcher,
    app_base_url: String,
}

impl TransitionEngine {
    pub fn new(db: SqlitePool, dispatcher: NotificationDispatcher, app_base_url: String) -> Self {
        Self {
            db,
            dispatcher,
            app_base_url,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.db.clone(),
            NotificationDispatcher::new(state.aws_service.clone()),
            state.app_base_url.clone(),
        )
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    async fn fetch_application(&self, application_id: &str) -> Result<EngineRow, PipelineError> {
        sqlx::query_as::<_, EngineRow>(
            r#"
            SELECT id, job_id, name, email, current_stage,
                   resume_score, mcq_score, async_interview_score, live_interview_score,
                   test_token, interview_token
            FROM applications WHERE id = ?
            "#,
        )
        .bind(application_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| PipelineError::NotFound(application_id.to_string()))
    }

    async fn fetch_job(&self, job_id: &str) -> Result<(String, PipelineConfig), PipelineError> {
        let job = sqlx::query_as::<_, JobRow>(
            "SELECT title, enabled_stages, auto_advance_thresholds, scoring_weights FROM jobs WHERE id = ?",
        )
        .bind(job_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| PipelineError::NotFound(format!("job {}", job_id)))?;

        let config = PipelineConfig::from_columns(
            job.enabled_stages.as_deref(),
            job.auto_advance_thresholds.as_deref(),
            job.scoring_weights.as_deref(),
        );
        Ok((job.title, config))
    }

    async fn persist_transition(
        &self,
        application_id: &str,
        target: Stage,
        changed_by: &str,
        notes: &str,
    ) -> Result<StageChange, PipelineError> {
        let status = status_for_stage(target);

        sqlx::query(
            r#"
            UPDATE applications
            SET status = ?, current_stage = ?, updated_at = datetime('now')
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(target.as_str())
        .bind(application_id)
        .execute(&self.db)
        .await?;

        let history_id = generate_history_id();
        sqlx::query(
            r#"
            INSERT INTO application_stage_history (id, application_id, stage, status, changed_by, notes, changed_at)
            VALUES (?, ?, ?, ?, ?, ?, datetime('now'))
            "#,
        )
        .bind(&history_id)
        .bind(application_id)
        .bind(target.as_str())
        .bind(status.as_str())
        .bind(changed_by)
        .bind(notes)
        .execute(&self.db)
        .await?;

        Ok(StageChange {
            stage: target,
            status,
        })
    }

    /// Move an application forward. With no explicit target the next enabled
    /// stage in the canonical order is used; `AlreadyAtFinalStage` when the
    /// application sits at `offer` (or a terminal state) and no target was
    /// given. Explicit targets go through the transition table, so fast-track
    /// hires are allowed but backward moves are not.
    pub async fn advance(
        &self,
        application_id: &str,
        explicit_target: Option<Stage>,
        changed_by: &str,
    ) -> Result<StageChange, PipelineError> {
        let application = self.fetch_application(application_id).await?;
        let current = application.stage();
        let (job_title, config) = self.fetch_job(&application.job_id).await?;

        let target = match explicit_target {
            Some(target) => {
                validate_transition(current, target)?;
                target
            }
            None => {
                if current.is_terminal() {
                    return Err(PipelineError::AlreadyAtFinalStage(current));
                }
                config.next_enabled_stage(current)?
            }
        };

        let change = self
            .persist_transition(
                application_id,
                target,
                changed_by,
                &format!("Advanced from {} to {}", current, target),
            )
            .await?;

        info!(
            application_id = %application_id,
            from = %current,
            to = %target,
            "Application advanced"
        );

        // Rejection emails are flag-controlled elsewhere; everything else
        // gets a best-effort stage update after the write lands.
        if target != Stage::Rejected {
            if let Err(e) = self
                .dispatcher
                .send(
                    application_id,
                    &application.email,
                    &Notification::StageUpdate { stage: target },
                    &application.name,
                    &job_title,
                )
                .await
            {
                warn!(
                    application_id = %application_id,
                    error = %e,
                    "Stage update email failed"
                );
            }
        }

        Ok(change)
    }

    /// Reject an application. Idempotent: rejecting an already-rejected
    /// application is a no-op success, not an error.
    pub async fn reject(
        &self,
        application_id: &str,
        changed_by: &str,
    ) -> Result<StageChange, PipelineError> {
        let application = self.fetch_application(application_id).await?;
        let current = application.stage();

        if current == Stage::Rejected {
            return Ok(StageChange {
                stage: Stage::Rejected,
                status: Status::Rejected,
            });
        }

        let change = self
            .persist_transition(
                application_id,
                Stage::Rejected,
                changed_by,
                &format!("Rejected at {} stage", current),
            )
            .await?;

        info!(application_id = %application_id, from = %current, "Application rejected");

        Ok(change)
    }

    /// Issue a capability token and email the invite link. The token write is
    /// a conditional update that only succeeds while the column is NULL, so
    /// two racing invites can never mint two valid tokens; the loser gets
    /// `AlreadyInvited`. The write always precedes the send: a failed email
    /// leaves the token in place (at-least-once write, best-effort notify).
    pub async fn send_stage_invite(
        &self,
        application_id: &str,
        kind: InviteKind,
    ) -> Result<InviteOutcome, PipelineError> {
        let application = self.fetch_application(application_id).await?;

        let existing = match kind {
            InviteKind::Test => &application.test_token,
            InviteKind::Interview => &application.interview_token,
        };
        if existing.is_some() {
            return Err(PipelineError::AlreadyInvited(kind.as_str()));
        }

        let token = generate_invite_token();

        let column = match kind {
            InviteKind::Test => "test_token",
            InviteKind::Interview => "interview_token",
        };
        let query = format!(
            "UPDATE applications SET {col} = ?, updated_at = datetime('now') WHERE id = ? AND {col} IS NULL",
            col = column
        );
        let result = sqlx::query(&query)
            .bind(&token)
            .bind(application_id)
            .execute(&self.db)
            .await?;

        // A concurrent invite won the conditional update
        if result.rows_affected() == 0 {
            return Err(PipelineError::AlreadyInvited(kind.as_str()));
        }

        let (job_title, _) = self.fetch_job(&application.job_id).await?;
        let link = invite_link(&self.app_base_url, kind, &token);
        let notification = match kind {
            InviteKind::Test => Notification::TestInvite { link },
            InviteKind::Interview => Notification::InterviewInvite { link },
        };

        let notify_succeeded = match self
            .dispatcher
            .send(
                application_id,
                &application.email,
                &notification,
                &application.name,
                &job_title,
            )
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    application_id = %application_id,
                    kind = %kind.as_str(),
                    error = %e,
                    "Invite token persisted but email failed"
                );
                false
            }
        };

        Ok(InviteOutcome {
            token,
            notify_succeeded,
        })
    }

    /// Record a per-stage score, recompute the overall score from the job's
    /// weights, and auto-advance when the configured threshold is met.
    pub async fn record_stage_score(
        &self,
        application_id: &str,
        stage: Stage,
        score: f64,
        changed_by: &str,
    ) -> Result<ScoreOutcome, PipelineError> {
        if !is_valid_score(score) {
            return Err(PipelineError::InvalidScore(score));
        }
        let column = match stage {
            Stage::ResumeScreening => "resume_score",
            Stage::McqTest => "mcq_score",
            Stage::AsyncInterview => "async_interview_score",
            Stage::LiveInterview => "live_interview_score",
            _ => return Err(PipelineError::InvalidTransition { from: stage, to: stage }),
        };

        let application = self.fetch_application(application_id).await?;
        let (_, config) = self.fetch_job(&application.job_id).await?;

        let mut scores = application.scores();
        scores.set(stage, score);
        let overall = compute_overall_score(&scores, &config.scoring_weights);

        let query = format!(
            "UPDATE applications SET {} = ?, overall_score = ?, updated_at = datetime('now') WHERE id = ?",
            column
        );
        sqlx::query(&query)
            .bind(score)
            .bind(overall)
            .bind(application_id)
            .execute(&self.db)
            .await?;

        info!(
            application_id = %application_id,
            stage = %stage,
            score = score,
            overall = ?overall,
            "Stage score recorded"
        );

        let mut auto_advanced = None;
        if let Some(threshold) = config.auto_advance_threshold(stage) {
            if score >= threshold && application.stage() == stage {
                match self.advance(application_id, None, "system").await {
                    Ok(change) => {
                        info!(
                            application_id = %application_id,
                            stage = %stage,
                            threshold = threshold,
                            next = %change.stage,
                            "Auto-advanced on score threshold"
                        );
                        auto_advanced = Some(change);
                    }
                    Err(e) => {
                        // Score is already persisted; a blocked advance (e.g.
                        // already at offer) is not an error for the caller
                        warn!(
                            application_id = %application_id,
                            error = %e,
                            "Auto-advance skipped"
                        );
                    }
                }
            }
        }

        Ok(ScoreOutcome {
            stage,
            score,
            overall_score: overall,
            auto_advanced,
        })
    }
}

/// 128 bits of entropy, base64url without padding (22 chars)
fn generate_invite_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invite_token_entropy_and_encoding() {
        let token = generate_invite_token();
        // 16 bytes -> 22 base64url chars, no padding
        assert_eq!(token.len(), 22);
        assert!(!token.contains('='));
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(generate_invite_token(), generate_invite_token());
    }
}
