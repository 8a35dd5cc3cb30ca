// src/pipeline/scoring.rs
//! Scoring aggregator: combines per-stage scores into an overall score
//! using the job's configured weights.

use serde::{Deserialize, Serialize};

use super::stage::Stage;
use super::PipelineError;

/// How far a weight sum may drift from 1.0 and still pass validation
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

/// Per-stage scores for one application. `None` means "not yet completed".
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StageScores {
    pub resume: Option<f64>,
    pub mcq: Option<f64>,
    pub async_interview: Option<f64>,
    pub live_interview: Option<f64>,
}

impl StageScores {
    pub fn get(&self, stage: Stage) -> Option<f64> {
        match stage {
            Stage::ResumeScreening => self.resume,
            Stage::McqTest => self.mcq,
            Stage::AsyncInterview => self.async_interview,
            Stage::LiveInterview => self.live_interview,
            _ => None,
        }
    }

    pub fn set(&mut self, stage: Stage, score: f64) {
        match stage {
            Stage::ResumeScreening => self.resume = Some(score),
            Stage::McqTest => self.mcq = Some(score),
            Stage::AsyncInterview => self.async_interview = Some(score),
            Stage::LiveInterview => self.live_interview = Some(score),
            _ => {}
        }
    }
}

/// Scoring weight per contributing stage, as fractions summing to 1.0.
///
/// Validated once, when the job's pipeline configuration is saved, not on
/// every scoring call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoringWeights {
    pub resume: f64,
    pub mcq: f64,
    pub async_interview: f64,
    pub live_interview: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            resume: 0.4,
            mcq: 0.3,
            async_interview: 0.2,
            live_interview: 0.1,
        }
    }
}

impl ScoringWeights {
    pub fn validate(&self) -> Result<(), PipelineError> {
        let components = [
            self.resume,
            self.mcq,
            self.async_interview,
            self.live_interview,
        ];
        if components.iter().any(|w| *w < 0.0 || *w > 1.0) {
            return Err(PipelineError::InvalidWeights(
                "each weight must be between 0.0 and 1.0".to_string(),
            ));
        }
        let sum: f64 = components.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(PipelineError::InvalidWeights(format!(
                "weights must sum to 1.0, got {:.3}",
                sum
            )));
        }
        Ok(())
    }
}

/// Weighted overall score over the *present* per-stage scores, re-normalized
/// so the present weights sum to 1.0.
///
/// With only a resume score of 80 and a resume weight of 0.4, the result is
/// 80 (its weight is the whole of the present total), not 32. Returns `None`
/// when no component score is present yet.
pub fn compute_overall_score(scores: &StageScores, weights: &ScoringWeights) -> Option<f64> {
    let components = [
        (scores.resume, weights.resume),
        (scores.mcq, weights.mcq),
        (scores.async_interview, weights.async_interview),
        (scores.live_interview, weights.live_interview),
    ];

    let mut weighted_sum = 0.0;
    let mut present_weight = 0.0;
    for (score, weight) in components {
        if let Some(score) = score {
            weighted_sum += score * weight;
            present_weight += weight;
        }
    }

    if present_weight <= 0.0 {
        return None;
    }
    Some(weighted_sum / present_weight)
}

/// Range check applied wherever a score enters the system
pub fn is_valid_score(score: f64) -> bool {
    (0.0..=100.0).contains(&score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_summing_to_one_pass() {
        let weights = ScoringWeights {
            resume: 0.5,
            mcq: 0.5,
            async_interview: 0.0,
            live_interview: 0.0,
        };
        assert!(weights.validate().is_ok());
    }

    #[test]
    fn test_weights_summing_to_point_nine_fail() {
        let weights = ScoringWeights {
            resume: 0.5,
            mcq: 0.4,
            async_interview: 0.0,
            live_interview: 0.0,
        };
        let err = weights.validate().unwrap_err();
        assert!(matches!(err, PipelineError::InvalidWeights(_)));
    }

    #[test]
    fn test_weights_within_tolerance_pass() {
        let weights = ScoringWeights {
            resume: 0.34,
            mcq: 0.33,
            async_interview: 0.33,
            live_interview: 0.005,
        };
        // Sums to 1.005, inside the 0.01 tolerance
        assert!(weights.validate().is_ok());
    }

    #[test]
    fn test_negative_weight_fails() {
        let weights = ScoringWeights {
            resume: 1.2,
            mcq: -0.2,
            async_interview: 0.0,
            live_interview: 0.0,
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn test_single_present_score_renormalizes() {
        let scores = StageScores {
            resume: Some(80.0),
            ..Default::default()
        };
        let weights = ScoringWeights::default();
        // Re-normalized policy: the only present weight becomes 1.0,
        // so the answer is 80, not 0.4 * 80 = 32.
        let overall = compute_overall_score(&scores, &weights).unwrap();
        assert!((overall - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_two_present_scores_weighted_proportionally() {
        let scores = StageScores {
            resume: Some(80.0),
            mcq: Some(60.0),
            ..Default::default()
        };
        let weights = ScoringWeights::default(); // resume 0.4, mcq 0.3
        let overall = compute_overall_score(&scores, &weights).unwrap();
        // (80*0.4 + 60*0.3) / 0.7
        let expected = (80.0 * 0.4 + 60.0 * 0.3) / 0.7;
        assert!((overall - expected).abs() < 1e-9);
    }

    #[test]
    fn test_all_scores_present_is_plain_weighted_sum() {
        let scores = StageScores {
            resume: Some(100.0),
            mcq: Some(100.0),
            async_interview: Some(100.0),
            live_interview: Some(100.0),
        };
        let overall = compute_overall_score(&scores, &ScoringWeights::default()).unwrap();
        assert!((overall - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_scores_yields_none() {
        let overall = compute_overall_score(&StageScores::default(), &ScoringWeights::default());
        assert!(overall.is_none());
    }

    #[test]
    fn test_score_range_check() {
        assert!(is_valid_score(0.0));
        assert!(is_valid_score(100.0));
        assert!(!is_valid_score(-0.1));
        assert!(!is_valid_score(100.1));
    }

    #[test]
    fn test_stage_scores_get_set() {
        let mut scores = StageScores::default();
        scores.set(super::super::stage::Stage::McqTest, 72.0);
        assert_eq!(scores.get(super::super::stage::Stage::McqTest), Some(72.0));
        // Terminal stages hold no score
        scores.set(super::super::stage::Stage::Hired, 50.0);
        assert_eq!(scores.get(super::super::stage::Stage::Hired), None);
    }
}
