// src/pipeline/mod.rs
//
// Candidate pipeline engine: stage model, scoring aggregator, transition
// engine, batch processor, and notification dispatcher. The stage and
// scoring parts are pure; the engine and batch processor persist through
// sqlx the same way the rest of the API does.

pub mod batch;
pub mod config;
pub mod engine;
pub mod notify;
pub mod scoring;
pub mod stage;

#[cfg(test)]
mod tests;

use thiserror::Error;

use crate::common::ApiError;
use stage::Stage;

/// What kind of candidate-facing invite an application can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteKind {
    Test,
    Interview,
}

impl InviteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InviteKind::Test => "test",
            InviteKind::Interview => "interview",
        }
    }

    pub fn parse(s: &str) -> Option<InviteKind> {
        match s {
            "test" => Some(InviteKind::Test),
            "interview" => Some(InviteKind::Interview),
            _ => None,
        }
    }
}

/// Pipeline-level errors, reported per item inside batches
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("application is already at final stage '{0}'")]
    AlreadyAtFinalStage(Stage),

    #[error("invalid transition from '{from}' to '{to}'")]
    InvalidTransition { from: Stage, to: Stage },

    #[error("a {0} invite was already sent for this application")]
    AlreadyInvited(&'static str),

    #[error("invalid scoring weights: {0}")]
    InvalidWeights(String),

    #[error("score {0} is outside the 0-100 range")]
    InvalidScore(f64),

    #[error("application not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("email delivery failed: {0}")]
    Email(String),
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::AlreadyAtFinalStage(_) => {
                ApiError::AlreadyAtFinalStage(err.to_string())
            }
            PipelineError::InvalidTransition { .. } => ApiError::BadRequest(err.to_string()),
            PipelineError::AlreadyInvited(_) => ApiError::Conflict(err.to_string()),
            PipelineError::InvalidWeights(_) | PipelineError::InvalidScore(_) => {
                ApiError::ValidationError(err.to_string())
            }
            PipelineError::NotFound(_) => ApiError::NotFound(err.to_string()),
            PipelineError::Database(e) => ApiError::DatabaseError(e),
            PipelineError::Email(_) => ApiError::ExternalServiceError(err.to_string()),
        }
    }
}
