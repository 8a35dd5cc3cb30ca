// src/common/migrations.rs
//! Database migration and schema management

use sqlx::SqlitePool;
use std::env;
use tracing::{info, warn};

/// Run all database migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Only drop tables if RESET_DB environment variable is set to "true"
    // This prevents data loss on server restarts
    let should_reset_db = env::var("RESET_DB").unwrap_or_else(|_| "false".to_string()) == "true";

    if should_reset_db {
        warn!("RESET_DB=true - Dropping all tables and recreating schema...");
        drop_all_tables(pool).await?;
        info!("Dropped old tables");
    }

    create_user_tables(pool).await?;
    create_job_tables(pool).await?;
    create_application_tables(pool).await?;
    create_system_tables(pool).await?;
    create_indexes(pool).await?;

    // Initialize default settings from environment variables
    init_default_settings(pool).await?;

    info!("Database migration completed");

    Ok(())
}

async fn drop_all_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let tables = [
        "application_stage_history",
        "applications",
        "jobs",
        "hr_users",
        "system_settings",
    ];
    for table in tables {
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
            .execute(pool)
            .await?;
    }
    Ok(())
}

async fn create_user_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS hr_users (
            id TEXT PRIMARY KEY,
            email TEXT UNIQUE NOT NULL,
            name TEXT,
            created_at TEXT DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_job_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            location TEXT,
            requirements TEXT,
            status TEXT NOT NULL DEFAULT 'draft'
                CHECK (status IN ('draft', 'active', 'closed')),
            enabled_stages TEXT,
            auto_advance_thresholds TEXT,
            scoring_weights TEXT,
            created_by TEXT,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_application_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS applications (
            id TEXT PRIMARY KEY,
            job_id TEXT NOT NULL REFERENCES jobs(id),
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT,
            resume_text TEXT,
            skills TEXT,
            years_experience INTEGER,
            cover_letter TEXT,
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'shortlisted', 'in_progress', 'rejected', 'hired')),
            current_stage TEXT NOT NULL DEFAULT 'resume_screening',
            resume_score REAL,
            mcq_score REAL,
            async_interview_score REAL,
            live_interview_score REAL,
            overall_score REAL,
            resume_analysis TEXT,
            test_token TEXT UNIQUE,
            interview_token TEXT UNIQUE,
            mcq_submitted_at TEXT,
            async_interview_responses TEXT,
            async_interview_submitted_at TEXT,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now')),
            UNIQUE (job_id, email)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS application_stage_history (
            id TEXT PRIMARY KEY,
            application_id TEXT NOT NULL REFERENCES applications(id),
            stage TEXT NOT NULL,
            status TEXT NOT NULL,
            changed_by TEXT NOT NULL,
            notes TEXT,
            changed_at TEXT DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_system_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS system_settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TEXT DEFAULT (datetime('now')),
            updated_by TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_applications_job_id ON applications(job_id)",
        "CREATE INDEX IF NOT EXISTS idx_applications_status ON applications(status)",
        "CREATE INDEX IF NOT EXISTS idx_applications_stage ON applications(current_stage)",
        "CREATE INDEX IF NOT EXISTS idx_stage_history_application_id ON application_stage_history(application_id)",
        "CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status)",
    ];
    for index in indexes {
        sqlx::query(index).execute(pool).await?;
    }
    Ok(())
}

/// Initialize default system settings from environment variables
/// Only sets values if they don't already exist in the database
async fn init_default_settings(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let settings = [
        ("aws_access_key_id", "AWS_ACCESS_KEY_ID"),
        ("aws_secret_access_key", "AWS_SECRET_ACCESS_KEY"),
        ("aws_region", "AWS_REGION"),
        ("aws_ses_from_email", "AWS_SES_FROM_EMAIL"),
        ("aws_ses_region", "AWS_SES_REGION"),
        ("openai_api_key", "OPENAI_API_KEY"),
        ("openai_model", "OPENAI_MODEL"),
    ];

    for (db_key, env_key) in settings {
        if let Ok(value) = env::var(env_key) {
            if !value.is_empty() {
                let existing: Option<(String,)> =
                    sqlx::query_as("SELECT value FROM system_settings WHERE key = ?")
                        .bind(db_key)
                        .fetch_optional(pool)
                        .await?;

                if existing.is_none() {
                    sqlx::query(
                        r#"
                        INSERT INTO system_settings (key, value, updated_at, updated_by)
                        VALUES (?, ?, datetime('now'), 'system')
                        "#,
                    )
                    .bind(db_key)
                    .bind(&value)
                    .execute(pool)
                    .await?;

                    info!(key = %db_key, "Initialized setting from environment variable");
                }
            }
        }
    }

    Ok(())
}
