// src/pipeline/stage.rs
//! Stage model for the candidate pipeline
//!
//! Canonical forward order:
//! resume_screening -> mcq_test -> async_interview -> live_interview -> offer
//!
//! `hired` and `rejected` are absorbing states reachable from any non-terminal
//! stage. The whole state machine lives in this file so illegal transitions
//! are rejected in one place instead of scattered string comparisons.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::PipelineError;

/// Fine-grained pipeline position of an application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ResumeScreening,
    McqTest,
    AsyncInterview,
    LiveInterview,
    Offer,
    Hired,
    Rejected,
}

/// Coarse-grained application status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    Shortlisted,
    InProgress,
    Rejected,
    Hired,
}

/// The five in-line stages, in canonical order
pub const PIPELINE_ORDER: [Stage; 5] = [
    Stage::ResumeScreening,
    Stage::McqTest,
    Stage::AsyncInterview,
    Stage::LiveInterview,
    Stage::Offer,
];

impl Stage {
    /// Wire/storage name, matching the snake_case serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::ResumeScreening => "resume_screening",
            Stage::McqTest => "mcq_test",
            Stage::AsyncInterview => "async_interview",
            Stage::LiveInterview => "live_interview",
            Stage::Offer => "offer",
            Stage::Hired => "hired",
            Stage::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Stage> {
        match s {
            "resume_screening" => Some(Stage::ResumeScreening),
            "mcq_test" => Some(Stage::McqTest),
            "async_interview" => Some(Stage::AsyncInterview),
            "live_interview" => Some(Stage::LiveInterview),
            "offer" => Some(Stage::Offer),
            "hired" => Some(Stage::Hired),
            "rejected" => Some(Stage::Rejected),
            _ => None,
        }
    }

    /// True for the absorbing states `hired` and `rejected`
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Hired | Stage::Rejected)
    }

    /// Position in the canonical order; terminal states have none
    pub fn order(&self) -> Option<u8> {
        match self {
            Stage::ResumeScreening => Some(0),
            Stage::McqTest => Some(1),
            Stage::AsyncInterview => Some(2),
            Stage::LiveInterview => Some(3),
            Stage::Offer => Some(4),
            Stage::Hired | Stage::Rejected => None,
        }
    }

    /// The stage immediately following this one in the canonical order.
    ///
    /// `offer` has no natural next stage (hiring takes an explicit target),
    /// and terminal stages never advance.
    pub fn next(&self) -> Result<Stage, PipelineError> {
        match self {
            Stage::ResumeScreening => Ok(Stage::McqTest),
            Stage::McqTest => Ok(Stage::AsyncInterview),
            Stage::AsyncInterview => Ok(Stage::LiveInterview),
            Stage::LiveInterview => Ok(Stage::Offer),
            Stage::Offer | Stage::Hired | Stage::Rejected => {
                Err(PipelineError::AlreadyAtFinalStage(*self))
            }
        }
    }
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Shortlisted => "shortlisted",
            Status::InProgress => "in_progress",
            Status::Rejected => "rejected",
            Status::Hired => "hired",
        }
    }

    pub fn parse(s: &str) -> Option<Status> {
        match s {
            "pending" => Some(Status::Pending),
            "shortlisted" => Some(Status::Shortlisted),
            "in_progress" => Some(Status::InProgress),
            "rejected" => Some(Status::Rejected),
            "hired" => Some(Status::Hired),
            _ => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status implied by a stage, keeping `status`/`current_stage` consistent:
/// `rejected` iff stage is `rejected`, `hired` iff stage is `hired`,
/// everything else is in progress.
pub fn status_for_stage(stage: Stage) -> Status {
    match stage {
        Stage::Hired => Status::Hired,
        Stage::Rejected => Status::Rejected,
        _ => Status::InProgress,
    }
}

/// Exhaustive transition table for the pipeline state machine.
///
/// Rules:
/// - terminal stages never transition out
/// - `rejected` is reachable from any non-terminal stage
/// - `hired` is reachable from any non-terminal stage (fast-track hire via an
///   explicit target; the natural `next()` chain still only reaches it
///   through `offer`)
/// - in-line moves must go forward, never backward or in place
pub fn validate_transition(from: Stage, to: Stage) -> Result<(), PipelineError> {
    if from.is_terminal() {
        return Err(PipelineError::InvalidTransition { from, to });
    }
    match to {
        Stage::Rejected | Stage::Hired => Ok(()),
        _ => match (from.order(), to.order()) {
            (Some(from_order), Some(to_order)) if to_order > from_order => Ok(()),
            _ => Err(PipelineError::InvalidTransition { from, to }),
        },
    }
}
