// src/main.rs
use axum::{extract::Extension, Router};
use dotenv::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::collections::HashSet;
use std::env;
use std::path::PathBuf;
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

// ============================================================================
// MODULE IMPORTS
// ============================================================================

mod admin;
mod auth;
mod candidates;
mod common;
mod jobs;
mod pipeline;
mod services;

use common::AppState;
use services::{AwsService, OpenAiService, SettingsService};

/// Seed an initial HR user from BOOTSTRAP_HR_EMAIL and log an access token
/// for it. Sign-in itself belongs to the upstream identity provider; this
/// gives a fresh deployment a first admin without manual database edits.
async fn bootstrap_hr_user(pool: &sqlx::SqlitePool, jwt_secret: &str) -> anyhow::Result<()> {
    let email = match env::var("BOOTSTRAP_HR_EMAIL") {
        Ok(e) if !e.trim().is_empty() => e.trim().to_lowercase(),
        _ => return Ok(()),
    };

    let existing: Option<String> = sqlx::query_scalar("SELECT id FROM hr_users WHERE email = ?")
        .bind(&email)
        .fetch_optional(pool)
        .await?;

    let user_id = match existing {
        Some(id) => id,
        None => {
            let id = common::generate_user_id();
            sqlx::query(
                "INSERT INTO hr_users (id, email, name, created_at) VALUES (?, ?, ?, datetime('now'))",
            )
            .bind(&id)
            .bind(&email)
            .bind("Bootstrap Admin")
            .execute(pool)
            .await?;
            info!(user_id = %id, "Bootstrap HR user created");
            id
        }
    };

    match auth::handlers::generate_jwt(&user_id, jwt_secret) {
        Ok(token) => info!(user_id = %user_id, token = %token, "Bootstrap access token"),
        Err(e) => tracing::warn!(error = %e, "Could not mint bootstrap token"),
    }

    Ok(())
}

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // ========================================================================
    // ENVIRONMENT CONFIGURATION
    // ========================================================================

    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://hireline.db".to_string());
    let jwt_secret =
        env::var("JWT_SECRET").unwrap_or_else(|_| "replace_with_strong_secret".to_string());
    let app_base_url =
        env::var("APP_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

    // Parse admin emails from comma-separated env var
    let admin_emails: HashSet<String> = env::var("ADMIN_EMAILS")
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    info!("Loaded {} admin email(s)", admin_emails.len());

    // ========================================================================
    // DATABASE SETUP
    // ========================================================================

    if let Some(path_part) = database_url.strip_prefix("sqlite://") {
        let path_without_params = path_part.split('?').next().unwrap_or("");
        if !path_without_params.is_empty() && !path_without_params.starts_with(':') {
            let db_path = PathBuf::from(path_without_params);
            if let Some(parent) = db_path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
        }
    }

    let connect_options = SqliteConnectOptions::from_str(&database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .connect_with(connect_options)
        .await?;

    // Run database migrations
    common::migrations::run_migrations(&pool).await?;

    bootstrap_hr_user(&pool, &jwt_secret).await?;

    // ========================================================================
    // SERVICE INITIALIZATION
    // ========================================================================

    let settings_service = Arc::new(SettingsService::new(pool.clone()));
    info!("SettingsService initialized");

    let openai_service = Arc::new(OpenAiService::new(settings_service.clone()));
    info!("OpenAiService initialized");

    let aws_service = Arc::new(AwsService::new(settings_service.clone()));
    info!("AwsService initialized");

    // ========================================================================
    // APPLICATION STATE
    // ========================================================================

    let app_state = AppState {
        db: pool,
        jwt_secret,
        admin_emails,
        app_base_url,
        settings_service,
        aws_service,
        openai_service,
    };

    let shared = Arc::new(RwLock::new(app_state));

    // ========================================================================
    // ROUTER COMPOSITION
    // ========================================================================

    let app = Router::new()
        .merge(auth::auth_routes())
        .merge(jobs::jobs_routes())
        .merge(candidates::candidates_routes())
        .merge(admin::admin_routes())
        .layer(Extension(shared.clone()))
        .layer({
            let cors_origins = std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string());

            let origins: Vec<axum::http::HeaderValue> = cors_origins
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PUT,
                    axum::http::Method::DELETE,
                    axum::http::Method::PATCH,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::AUTHORIZATION,
                ])
                .allow_credentials(true)
        })
        .layer(TraceLayer::new_for_http());

    // ========================================================================
    // SERVER STARTUP
    // ========================================================================

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
