// Application state shared across all modules

use sqlx::SqlitePool;
use std::collections::HashSet;
use std::sync::Arc;

use crate::services::{AwsService, OpenAiService, SettingsService};

/// Application state containing database pool, services, and configuration
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub jwt_secret: String,
    /// Emails with admin role; everyone else in hr_users is plain `hr`
    pub admin_emails: HashSet<String>,
    /// Base URL used when building candidate-facing invite links
    pub app_base_url: String,
    pub settings_service: Arc<SettingsService>,
    pub aws_service: Arc<AwsService>,
    pub openai_service: Arc<OpenAiService>,
}
