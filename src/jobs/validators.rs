// src/jobs/validators.rs

use super::models::*;
use crate::common::{ValidationResult, Validator};
use crate::pipeline::config::PipelineConfig;
use std::collections::HashSet;

// ============================================================================
// Job Validators
// ============================================================================

pub struct JobValidator;

fn validate_status(status: &str, result: &mut ValidationResult) {
    let valid_statuses = HashSet::from(["draft", "active", "closed"]);
    if !valid_statuses.contains(status) {
        result.add_error("status", "Invalid job status");
    }
}

fn validate_pipeline(pipeline: &PipelineConfig, result: &mut ValidationResult) {
    // Weight-sum and threshold problems are caller errors, caught at save
    // time rather than on every scoring call
    if let Err(e) = pipeline.validate() {
        result.add_error("pipeline", &e.to_string());
    }
}

impl Validator<CreateJob> for JobValidator {
    fn validate(&self, data: &CreateJob) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.title.trim().is_empty() {
            result.add_error("title", "Job title is required");
        } else if data.title.len() > 255 {
            result.add_error("title", "Job title must be less than 255 characters");
        }

        if let Some(description) = &data.description {
            if description.len() > 10000 {
                result.add_error(
                    "description",
                    "Description must be less than 10000 characters",
                );
            }
        }

        if let Some(location) = &data.location {
            if location.len() > 255 {
                result.add_error("location", "Location must be less than 255 characters");
            }
        }

        if let Some(status) = &data.status {
            validate_status(status, &mut result);
        }

        if let Some(pipeline) = &data.pipeline {
            validate_pipeline(pipeline, &mut result);
        }

        result
    }
}

impl Validator<UpdateJob> for JobValidator {
    fn validate(&self, data: &UpdateJob) -> ValidationResult {
        let mut result = ValidationResult::new();

        if let Some(title) = &data.title {
            if title.trim().is_empty() {
                result.add_error("title", "Job title cannot be empty");
            } else if title.len() > 255 {
                result.add_error("title", "Job title must be less than 255 characters");
            }
        }

        if let Some(description) = &data.description {
            if description.len() > 10000 {
                result.add_error(
                    "description",
                    "Description must be less than 10000 characters",
                );
            }
        }

        if let Some(location) = &data.location {
            if location.len() > 255 {
                result.add_error("location", "Location must be less than 255 characters");
            }
        }

        if let Some(status) = &data.status {
            validate_status(status, &mut result);
        }

        if let Some(pipeline) = &data.pipeline {
            validate_pipeline(pipeline, &mut result);
        }

        result
    }
}
