// src/candidates/validators.rs

use regex::Regex;
use std::sync::OnceLock;

use super::models::*;
use crate::common::{ValidationResult, Validator};

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static email pattern")
    })
}

// ============================================================================
// Application Validators
// ============================================================================

pub struct ApplicationValidator;

impl Validator<SubmitApplicationRequest> for ApplicationValidator {
    fn validate(&self, data: &SubmitApplicationRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.name.trim().is_empty() {
            result.add_error("name", "Name is required");
        } else if data.name.len() > 255 {
            result.add_error("name", "Name must be less than 255 characters");
        }

        if data.email.trim().is_empty() {
            result.add_error("email", "Email is required");
        } else if !email_regex().is_match(data.email.trim()) {
            result.add_error("email", "Email must be valid");
        }

        if let Some(phone) = &data.phone {
            if phone.len() > 50 {
                result.add_error("phone", "Phone number must be less than 50 characters");
            }
        }

        if let Some(resume_text) = &data.resume_text {
            if resume_text.len() > 100_000 {
                result.add_error("resume_text", "Resume text is too large");
            }
        }

        if let Some(years) = data.years_experience {
            if !(0..=60).contains(&years) {
                result.add_error("years_experience", "Years of experience must be 0-60");
            }
        }

        if let Some(skills) = &data.skills {
            if skills.len() > 100 {
                result.add_error("skills", "Too many skills listed");
            }
        }

        if let Some(cover_letter) = &data.cover_letter {
            if cover_letter.len() > 10000 {
                result.add_error(
                    "cover_letter",
                    "Cover letter must be less than 10000 characters",
                );
            }
        }

        result
    }
}

pub struct McqSubmissionValidator;

impl Validator<McqSubmission> for McqSubmissionValidator {
    fn validate(&self, data: &McqSubmission) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.total_questions <= 0 {
            result.add_error("total_questions", "Total questions must be positive");
        }
        if data.correct_answers < 0 {
            result.add_error("correct_answers", "Correct answers cannot be negative");
        }
        if data.total_questions > 0 && data.correct_answers > data.total_questions {
            result.add_error(
                "correct_answers",
                "Correct answers cannot exceed total questions",
            );
        }

        result
    }
}

pub struct AsyncInterviewValidator;

impl Validator<AsyncInterviewSubmission> for AsyncInterviewValidator {
    fn validate(&self, data: &AsyncInterviewSubmission) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.responses.is_empty() {
            result.add_error("responses", "At least one response is required");
        } else if data.responses.len() > 20 {
            result.add_error("responses", "Too many responses");
        } else if data.responses.iter().any(|r| r.len() > 20000) {
            result.add_error("responses", "A response is too long");
        }

        result
    }
}
