// src/candidates/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Application Models
// ============================================================================

#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct Application {
    pub id: String,
    pub job_id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub resume_text: Option<String>,
    pub skills: Option<String>, // JSON string in DB, will be parsed
    pub years_experience: Option<i64>,
    pub cover_letter: Option<String>,
    pub status: String,
    pub current_stage: String,
    pub resume_score: Option<f64>,
    pub mcq_score: Option<f64>,
    pub async_interview_score: Option<f64>,
    pub live_interview_score: Option<f64>,
    pub overall_score: Option<f64>,
    pub resume_analysis: Option<String>, // JSON string from the AI scorer
    // Capability tokens are never serialized out
    #[serde(skip_serializing)]
    pub test_token: Option<String>,
    #[serde(skip_serializing)]
    pub interview_token: Option<String>,
    pub mcq_submitted_at: Option<String>,
    #[serde(skip_serializing)]
    pub async_interview_responses: Option<String>,
    pub async_interview_submitted_at: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Application response with JSON columns parsed and token presence exposed
/// as booleans instead of the tokens themselves
#[derive(Serialize, Debug)]
pub struct ApplicationResponse {
    pub id: String,
    pub job_id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub resume_text: Option<String>,
    pub skills: Vec<String>,
    pub years_experience: Option<i64>,
    pub cover_letter: Option<String>,
    pub status: String,
    pub current_stage: String,
    pub resume_score: Option<f64>,
    pub mcq_score: Option<f64>,
    pub async_interview_score: Option<f64>,
    pub live_interview_score: Option<f64>,
    pub overall_score: Option<f64>,
    pub resume_analysis: Option<serde_json::Value>,
    pub test_invited: bool,
    pub interview_invited: bool,
    pub mcq_submitted_at: Option<String>,
    pub async_interview_submitted_at: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<Application> for ApplicationResponse {
    fn from(app: Application) -> Self {
        let skills = app
            .skills
            .as_deref()
            .and_then(|s| serde_json::from_str::<Vec<String>>(s).ok())
            .unwrap_or_default();

        let resume_analysis = app
            .resume_analysis
            .as_deref()
            .and_then(|a| serde_json::from_str(a).ok());

        ApplicationResponse {
            id: app.id,
            job_id: app.job_id,
            name: app.name,
            email: app.email,
            phone: app.phone,
            resume_text: app.resume_text,
            skills,
            years_experience: app.years_experience,
            cover_letter: app.cover_letter,
            status: app.status,
            current_stage: app.current_stage,
            resume_score: app.resume_score,
            mcq_score: app.mcq_score,
            async_interview_score: app.async_interview_score,
            live_interview_score: app.live_interview_score,
            overall_score: app.overall_score,
            resume_analysis,
            test_invited: app.test_token.is_some(),
            interview_invited: app.interview_token.is_some(),
            mcq_submitted_at: app.mcq_submitted_at,
            async_interview_submitted_at: app.async_interview_submitted_at,
            created_at: app.created_at,
            updated_at: app.updated_at,
        }
    }
}

#[derive(FromRow, Serialize, Debug)]
pub struct StageHistoryEntry {
    pub id: String,
    pub stage: String,
    pub status: String,
    pub changed_by: Option<String>,
    pub notes: Option<String>,
    pub changed_at: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct ApplicationDetailResponse {
    #[serde(flatten)]
    pub application: ApplicationResponse,
    pub stage_history: Vec<StageHistoryEntry>,
}

// ============================================================================
// Request Models
// ============================================================================

#[derive(Deserialize, Debug)]
pub struct SubmitApplicationRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub resume_text: Option<String>,
    pub skills: Option<Vec<String>>,
    pub years_experience: Option<i64>,
    pub cover_letter: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct AdvanceStageRequest {
    /// Explicit target stage; omitted means "next enabled stage"
    pub target_stage: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct InviteRequest {
    /// "test" or "interview"
    pub kind: String,
}

#[derive(Deserialize, Debug)]
pub struct RecordScoreRequest {
    pub stage: String,
    pub score: f64,
}

/// MCQ results as graded by the test runner. The percentage is derived
/// server-side from the counts.
#[derive(Deserialize, Debug)]
pub struct McqSubmission {
    pub correct_answers: i64,
    pub total_questions: i64,
}

#[derive(Deserialize, Debug)]
pub struct AsyncInterviewSubmission {
    /// Free-text answers, one per prompt
    pub responses: Vec<String>,
}

/// What the token-gated candidate endpoints expose: enough to render the
/// test/interview page, nothing else about the application
#[derive(Serialize, Debug)]
pub struct CandidateAccessResponse {
    pub candidate_name: String,
    pub job_title: String,
    pub already_submitted: bool,
}

// ============================================================================
// Analytics Models
// ============================================================================

#[derive(FromRow, Serialize, Debug)]
pub struct StageCount {
    pub current_stage: String,
    pub count: i64,
}

#[derive(FromRow, Serialize, Debug)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Serialize, Debug)]
pub struct PipelineAnalytics {
    pub total_applications: i64,
    pub by_stage: Vec<StageCount>,
    pub by_status: Vec<StatusCount>,
    pub average_overall_score: Option<f64>,
    pub hired_count: i64,
    pub rejected_count: i64,
}
