// src/services/mod.rs

pub mod aws;
pub mod openai;
pub mod settings;

pub use aws::AwsService;
pub use openai::OpenAiService;
pub use settings::SettingsService;
