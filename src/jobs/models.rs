// src/jobs/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::pipeline::config::PipelineConfig;

// ============================================================================
// Job Models
// ============================================================================

#[derive(FromRow, Serialize, Deserialize, Debug)]
pub struct Job {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>, // JSON string in DB, will be parsed
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled_stages: Option<String>, // JSON string in DB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_advance_thresholds: Option<String>, // JSON string in DB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scoring_weights: Option<String>, // JSON string in DB
    pub created_by: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Job response with the JSON columns parsed into real types
#[derive(Serialize, Debug)]
pub struct JobResponse {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub requirements: Option<Vec<String>>,
    pub status: Option<String>,
    pub pipeline: PipelineConfig,
    pub created_by: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        let requirements = job
            .requirements
            .and_then(|r| serde_json::from_str::<Vec<String>>(&r).ok());

        let pipeline = PipelineConfig::from_columns(
            job.enabled_stages.as_deref(),
            job.auto_advance_thresholds.as_deref(),
            job.scoring_weights.as_deref(),
        );

        JobResponse {
            id: job.id,
            title: job.title,
            description: job.description,
            location: job.location,
            requirements,
            status: job.status,
            pipeline,
            created_by: job.created_by,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct JobListResponse {
    pub jobs: Vec<JobResponse>,
    pub total: usize,
}

#[derive(Deserialize)]
pub struct CreateJob {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub requirements: Option<Vec<String>>,
    pub status: Option<String>,
    pub pipeline: Option<PipelineConfig>,
}

#[derive(Deserialize)]
pub struct UpdateJob {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub requirements: Option<Vec<String>>,
    pub status: Option<String>,
    pub pipeline: Option<PipelineConfig>,
}

impl UpdateJob {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.requirements.is_none()
            && self.status.is_none()
            && self.pipeline.is_none()
    }
}
