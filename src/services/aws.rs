// src/services/aws.rs
//! AWS SESv2 email delivery, configured from the settings store.

use aws_config::BehaviorVersion;
use aws_sdk_sesv2::config::{Credentials, Region};
use aws_sdk_sesv2::Client as SesClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use crate::services::settings::{SettingsError, SettingsService};

#[derive(Debug, Error)]
pub enum AwsError {
    #[error("AWS credentials not configured")]
    NotConfigured,

    #[error("SES operation failed: {0}")]
    SesError(String),

    #[error("Settings error: {0}")]
    SettingsError(#[from] SettingsError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub ses_from_email: String,
}

#[derive(Debug)]
pub struct AwsService {
    settings_service: Arc<SettingsService>,
}

impl AwsService {
    pub fn new(settings_service: Arc<SettingsService>) -> Self {
        Self { settings_service }
    }

    /// Get AWS configuration from settings
    pub async fn get_config(&self) -> Result<AwsConfig, AwsError> {
        let keys = [
            "aws_access_key_id",
            "aws_secret_access_key",
            "aws_region",
            "aws_ses_from_email",
            "aws_ses_region",
        ];

        let settings = self.settings_service.get_settings(&keys).await?;

        let access_key_id = settings
            .get("aws_access_key_id")
            .and_then(|v| v.clone())
            .ok_or(AwsError::NotConfigured)?;

        let secret_access_key = settings
            .get("aws_secret_access_key")
            .and_then(|v| v.clone())
            .ok_or(AwsError::NotConfigured)?;

        // SES region falls back to the general region setting
        let region = settings
            .get("aws_ses_region")
            .and_then(|v| v.clone())
            .or_else(|| settings.get("aws_region").and_then(|v| v.clone()))
            .unwrap_or_else(|| "us-east-1".to_string());

        let ses_from_email = settings
            .get("aws_ses_from_email")
            .and_then(|v| v.clone())
            .ok_or(AwsError::NotConfigured)?;

        Ok(AwsConfig {
            access_key_id,
            secret_access_key,
            region,
            ses_from_email,
        })
    }

    async fn get_ses_client(&self, config: &AwsConfig) -> SesClient {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "settings",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        SesClient::new(&sdk_config)
    }

    /// Send an HTML email through SESv2
    pub async fn send_email(
        &self,
        to: Vec<String>,
        subject: &str,
        body: &str,
    ) -> Result<(), AwsError> {
        let config = self.get_config().await?;
        let client = self.get_ses_client(&config).await;

        use aws_sdk_sesv2::types::{Body as SesBody, Content, Destination, EmailContent, Message};

        let destination = Destination::builder()
            .set_to_addresses(Some(to.clone()))
            .build();

        let subject_content = Content::builder()
            .data(subject)
            .charset("UTF-8")
            .build()
            .map_err(|e| AwsError::SesError(format!("Failed to build subject: {}", e)))?;

        let body_content = Content::builder()
            .data(body)
            .charset("UTF-8")
            .build()
            .map_err(|e| AwsError::SesError(format!("Failed to build body: {}", e)))?;

        let ses_body = SesBody::builder().html(body_content).build();

        let message = Message::builder()
            .subject(subject_content)
            .body(ses_body)
            .build();

        let email_content = EmailContent::builder().simple(message).build();

        let result = client
            .send_email()
            .from_email_address(&config.ses_from_email)
            .destination(destination)
            .content(email_content)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, to = ?to, "Failed to send email via SES");
                AwsError::SesError(format!("Send failed: {}", e))
            })?;

        info!(
            to = ?to,
            message_id = ?result.message_id(),
            "Email sent via SES"
        );

        Ok(())
    }
}
