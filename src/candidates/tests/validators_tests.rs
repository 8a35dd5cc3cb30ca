// src/candidates/tests/validators_tests.rs

#[cfg(test)]
mod tests {
    use crate::candidates::models::*;
    use crate::candidates::validators::*;
    use crate::common::Validator;

    fn valid_submission() -> SubmitApplicationRequest {
        SubmitApplicationRequest {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: Some("+44 20 7946 0000".to_string()),
            resume_text: Some("Ten years of systems programming.".to_string()),
            skills: Some(vec!["Rust".to_string(), "SQL".to_string()]),
            years_experience: Some(10),
            cover_letter: None,
        }
    }

    #[test]
    fn test_application_validator_valid_data() {
        let result = ApplicationValidator.validate(&valid_submission());
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_application_validator_missing_name() {
        let mut request = valid_submission();
        request.name = "  ".to_string();

        let result = ApplicationValidator.validate(&request);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.field == "name"));
    }

    #[test]
    fn test_application_validator_bad_email() {
        for bad in ["", "not-an-email", "a@b", "two words@example.com"] {
            let mut request = valid_submission();
            request.email = bad.to_string();

            let result = ApplicationValidator.validate(&request);
            assert!(!result.is_valid, "email '{}' should be rejected", bad);
            assert!(result.errors.iter().any(|e| e.field == "email"));
        }
    }

    #[test]
    fn test_application_validator_years_out_of_range() {
        let mut request = valid_submission();
        request.years_experience = Some(99);

        let result = ApplicationValidator.validate(&request);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.field == "years_experience"));
    }

    #[test]
    fn test_mcq_validator_accepts_valid_counts() {
        let result = McqSubmissionValidator.validate(&McqSubmission {
            correct_answers: 7,
            total_questions: 10,
        });
        assert!(result.is_valid);
    }

    #[test]
    fn test_mcq_validator_rejects_impossible_counts() {
        let result = McqSubmissionValidator.validate(&McqSubmission {
            correct_answers: 11,
            total_questions: 10,
        });
        assert!(!result.is_valid);

        let result = McqSubmissionValidator.validate(&McqSubmission {
            correct_answers: 0,
            total_questions: 0,
        });
        assert!(!result.is_valid);
    }

    #[test]
    fn test_interview_validator_rejects_empty_responses() {
        let result = AsyncInterviewValidator.validate(&AsyncInterviewSubmission {
            responses: vec![],
        });
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.field == "responses"));
    }

    #[test]
    fn test_interview_validator_accepts_responses() {
        let result = AsyncInterviewValidator.validate(&AsyncInterviewSubmission {
            responses: vec!["I would start by profiling the query.".to_string()],
        });
        assert!(result.is_valid);
    }
}
