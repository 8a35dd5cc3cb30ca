// src/jobs/tests/validators_tests.rs

#[cfg(test)]
mod tests {
    use crate::common::Validator;
    use crate::jobs::models::*;
    use crate::jobs::validators::*;
    use crate::pipeline::config::PipelineConfig;
    use crate::pipeline::stage::Stage;

    #[test]
    fn test_job_validator_valid_data() {
        let validator = JobValidator;
        let request = CreateJob {
            title: "Software Engineer".to_string(),
            description: Some("Test description".to_string()),
            location: Some("Remote".to_string()),
            requirements: Some(vec!["Rust".to_string(), "SQL".to_string()]),
            status: Some("draft".to_string()),
            pipeline: Some(PipelineConfig::default()),
        };

        let result = validator.validate(&request);
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_job_validator_invalid_title() {
        let validator = JobValidator;
        let request = CreateJob {
            title: "".to_string(), // Empty title
            description: None,
            location: None,
            requirements: None,
            status: None,
            pipeline: None,
        };

        let result = validator.validate(&request);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.field == "title"));
    }

    #[test]
    fn test_job_validator_invalid_status() {
        let validator = JobValidator;
        let request = CreateJob {
            title: "Backend Engineer".to_string(),
            description: None,
            location: None,
            requirements: None,
            status: Some("archived".to_string()),
            pipeline: None,
        };

        let result = validator.validate(&request);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.field == "status"));
    }

    #[test]
    fn test_job_validator_rejects_bad_weights() {
        let validator = JobValidator;
        let mut pipeline = PipelineConfig::default();
        pipeline.scoring_weights.resume = 0.2; // sum now 0.8

        let request = CreateJob {
            title: "Backend Engineer".to_string(),
            description: None,
            location: None,
            requirements: None,
            status: None,
            pipeline: Some(pipeline),
        };

        let result = validator.validate(&request);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.field == "pipeline"));
    }

    #[test]
    fn test_job_validator_rejects_terminal_enabled_stage() {
        let validator = JobValidator;
        let mut pipeline = PipelineConfig::default();
        pipeline.enabled_stages.push(Stage::Hired);

        let request = CreateJob {
            title: "Backend Engineer".to_string(),
            description: None,
            location: None,
            requirements: None,
            status: None,
            pipeline: Some(pipeline),
        };

        let result = validator.validate(&request);
        assert!(!result.is_valid);
    }

    #[test]
    fn test_update_validator_allows_partial_body() {
        let validator = JobValidator;
        let request = UpdateJob {
            title: None,
            description: None,
            location: None,
            requirements: None,
            status: Some("closed".to_string()),
            pipeline: None,
        };

        let result = validator.validate(&request);
        assert!(result.is_valid);
    }

    #[test]
    fn test_update_validator_rejects_empty_title() {
        let validator = JobValidator;
        let request = UpdateJob {
            title: Some("   ".to_string()),
            description: None,
            location: None,
            requirements: None,
            status: None,
            pipeline: None,
        };

        let result = validator.validate(&request);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.field == "title"));
    }
}
