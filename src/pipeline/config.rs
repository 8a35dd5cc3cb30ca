// src/pipeline/config.rs
//! Per-job pipeline configuration: which stages are enabled, optional
//! auto-advance thresholds, and the scoring weights. Stored as JSON columns
//! on the job row and validated when the job is saved.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::scoring::ScoringWeights;
use super::stage::{Stage, PIPELINE_ORDER};
use super::PipelineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// In-line stages this job actually uses. Terminal states are always
    /// present and never listed here.
    pub enabled_stages: Vec<Stage>,
    /// Score thresholds that advance a candidate automatically once met
    #[serde(default)]
    pub auto_advance_thresholds: HashMap<Stage, f64>,
    pub scoring_weights: ScoringWeights,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enabled_stages: PIPELINE_ORDER.to_vec(),
            auto_advance_thresholds: HashMap::new(),
            scoring_weights: ScoringWeights::default(),
        }
    }
}

impl PipelineConfig {
    /// Validation run at job-save time. Weight-sum problems surface here,
    /// once, not on every scoring call.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.enabled_stages.is_empty() {
            return Err(PipelineError::InvalidWeights(
                "at least one pipeline stage must be enabled".to_string(),
            ));
        }
        for stage in &self.enabled_stages {
            if stage.is_terminal() {
                return Err(PipelineError::InvalidWeights(format!(
                    "terminal stage '{}' cannot be listed as an enabled stage",
                    stage
                )));
            }
        }
        for (stage, threshold) in &self.auto_advance_thresholds {
            if !(0.0..=100.0).contains(threshold) {
                return Err(PipelineError::InvalidScore(*threshold));
            }
            if stage.is_terminal() {
                return Err(PipelineError::InvalidWeights(format!(
                    "terminal stage '{}' cannot carry an auto-advance threshold",
                    stage
                )));
            }
        }
        self.scoring_weights.validate()
    }

    pub fn stage_enabled(&self, stage: Stage) -> bool {
        stage.is_terminal() || self.enabled_stages.contains(&stage)
    }

    pub fn auto_advance_threshold(&self, stage: Stage) -> Option<f64> {
        self.auto_advance_thresholds.get(&stage).copied()
    }

    /// The stage an application naturally moves to from `current`, skipping
    /// disabled in-line stages. Runs off the end with `AlreadyAtFinalStage`
    /// when nothing enabled remains.
    pub fn next_enabled_stage(&self, current: Stage) -> Result<Stage, PipelineError> {
        let mut candidate = current.next()?;
        while !self.stage_enabled(candidate) {
            candidate = candidate.next()?;
        }
        Ok(candidate)
    }

    /// Reassemble a config from the job row's JSON columns, tolerating
    /// missing columns on jobs created before pipeline config existed.
    pub fn from_columns(
        enabled_stages: Option<&str>,
        auto_advance_thresholds: Option<&str>,
        scoring_weights: Option<&str>,
    ) -> PipelineConfig {
        let defaults = PipelineConfig::default();
        PipelineConfig {
            enabled_stages: enabled_stages
                .and_then(|json| serde_json::from_str(json).ok())
                .unwrap_or(defaults.enabled_stages),
            auto_advance_thresholds: auto_advance_thresholds
                .and_then(|json| serde_json::from_str(json).ok())
                .unwrap_or(defaults.auto_advance_thresholds),
            scoring_weights: scoring_weights
                .and_then(|json| serde_json::from_str(json).ok())
                .unwrap_or(defaults.scoring_weights),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_bad_weights_fail_at_config_save() {
        let mut config = PipelineConfig::default();
        config.scoring_weights.resume = 0.9; // sum now 1.5
        assert!(matches!(
            config.validate().unwrap_err(),
            PipelineError::InvalidWeights(_)
        ));
    }

    #[test]
    fn test_terminal_stage_cannot_be_enabled() {
        let mut config = PipelineConfig::default();
        config.enabled_stages.push(Stage::Hired);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_next_enabled_stage_skips_disabled() {
        let config = PipelineConfig {
            enabled_stages: vec![Stage::ResumeScreening, Stage::LiveInterview, Stage::Offer],
            ..Default::default()
        };
        // mcq_test and async_interview are disabled for this job
        assert_eq!(
            config.next_enabled_stage(Stage::ResumeScreening).unwrap(),
            Stage::LiveInterview
        );
        assert_eq!(
            config.next_enabled_stage(Stage::LiveInterview).unwrap(),
            Stage::Offer
        );
    }

    #[test]
    fn test_next_enabled_stage_fails_past_offer() {
        let config = PipelineConfig::default();
        assert!(matches!(
            config.next_enabled_stage(Stage::Offer).unwrap_err(),
            PipelineError::AlreadyAtFinalStage(_)
        ));
    }

    #[test]
    fn test_from_columns_falls_back_to_defaults() {
        let config = PipelineConfig::from_columns(None, Some("not-json"), None);
        assert_eq!(config.enabled_stages, PIPELINE_ORDER.to_vec());
        assert!(config.auto_advance_thresholds.is_empty());
        assert_eq!(config.scoring_weights, ScoringWeights::default());
    }
}
