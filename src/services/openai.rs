// src/services/openai.rs
//! Resume-to-job match scoring through the OpenAI API. The model is treated
//! as a black box returning a 0-100 score plus structured analysis; any
//! failure surfaces as an external-service error and never blocks the
//! surrounding application write.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::services::settings::SettingsService;

#[derive(Debug, Error)]
pub enum OpenAiError {
    #[error("API key not configured")]
    NotConfigured,

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Settings error: {0}")]
    SettingsError(String),
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

/// Structured outcome of scoring a resume against a job's requirements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchAnalysis {
    /// 0-100
    pub score: f64,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
    /// Required skill -> whether the resume shows evidence of it
    #[serde(default)]
    pub skills_match: std::collections::HashMap<String, bool>,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug)]
pub struct OpenAiService {
    settings_service: Arc<SettingsService>,
    http: Client,
}

const SYSTEM_PROMPT: &str = "You are a technical recruiter assistant. Score how well a \
resume matches a job's requirements. Respond with JSON only, no prose, in the shape \
{\"score\": <0-100 number>, \"strengths\": [..], \"concerns\": [..], \
\"skills_match\": {\"<skill>\": <bool>, ..}}.";

impl OpenAiService {
    pub fn new(settings_service: Arc<SettingsService>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();
        Self {
            settings_service,
            http,
        }
    }

    pub async fn get_config(&self) -> Result<OpenAiConfig, OpenAiError> {
        let api_key = self
            .settings_service
            .get_setting("openai_api_key")
            .await
            .map_err(|e| OpenAiError::SettingsError(e.to_string()))?
            .ok_or(OpenAiError::NotConfigured)?;

        let model = self
            .settings_service
            .get_setting("openai_model")
            .await
            .map_err(|e| OpenAiError::SettingsError(e.to_string()))?
            .unwrap_or_else(|| "gpt-4o-mini".to_string());

        Ok(OpenAiConfig {
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
            model,
        })
    }

    /// Score a resume against a job. Returns the parsed analysis; the caller
    /// decides what an unavailable scorer means for the application.
    pub async fn score_resume(
        &self,
        resume_text: &str,
        job_title: &str,
        requirements: &[String],
    ) -> Result<MatchAnalysis, OpenAiError> {
        let config = self.get_config().await?;

        let prompt = format!(
            "Job title: {}\nRequirements:\n{}\n\nResume:\n{}",
            job_title,
            requirements
                .iter()
                .map(|r| format!("- {}", r))
                .collect::<Vec<_>>()
                .join("\n"),
            resume_text
        );

        let request = ChatCompletionRequest {
            model: config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt,
                },
            ],
            temperature: 0.2,
            max_tokens: 1000,
        };

        debug!(model = %config.model, job_title = %job_title, "Sending resume scoring request");

        let response = self
            .http
            .post(format!("{}/chat/completions", config.base_url))
            .bearer_auth(&config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| OpenAiError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "OpenAI request failed");
            return Err(OpenAiError::RequestFailed(format!("HTTP {}", status)));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| OpenAiError::InvalidResponse(e.to_string()))?;

        let content = completion
            .choices
            .first()
            .ok_or_else(|| OpenAiError::InvalidResponse("No choices in response".to_string()))?
            .message
            .content
            .clone();

        let analysis = parse_match_analysis(&content)?;

        info!(
            job_title = %job_title,
            score = analysis.score,
            "Resume scored"
        );

        Ok(analysis)
    }
}

/// Parse the model's JSON answer, tolerating markdown code fences and
/// clamping the score into range
fn parse_match_analysis(content: &str) -> Result<MatchAnalysis, OpenAiError> {
    let trimmed = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let mut analysis: MatchAnalysis = serde_json::from_str(trimmed)
        .map_err(|e| OpenAiError::InvalidResponse(format!("bad analysis JSON: {}", e)))?;
    analysis.score = analysis.score.clamp(0.0, 100.0);
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let analysis = parse_match_analysis(
            r#"{"score": 72, "strengths": ["Rust"], "concerns": [], "skills_match": {"rust": true}}"#,
        )
        .unwrap();
        assert_eq!(analysis.score, 72.0);
        assert_eq!(analysis.strengths, vec!["Rust"]);
        assert_eq!(analysis.skills_match.get("rust"), Some(&true));
    }

    #[test]
    fn test_parse_fenced_json_and_clamp() {
        let analysis =
            parse_match_analysis("```json\n{\"score\": 150}\n```").unwrap();
        assert_eq!(analysis.score, 100.0);
        assert!(analysis.strengths.is_empty());
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(parse_match_analysis("the candidate seems fine").is_err());
    }
}
