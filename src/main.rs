//! Souq E-commerce - Bilingual Storefront Backend

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::routing::get;
use axum::{Json, Router};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use uuid::Uuid;

use souq_ecommerce::auth::hash_password;
use souq_ecommerce::config::Config;
use souq_ecommerce::handlers;
use souq_ecommerce::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;
    ensure_admin(&db, &config).await?;

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url).await {
            Ok(client) => Some(client),
            Err(err) => {
                tracing::warn!(error = %err, "NATS unreachable, events disabled");
                None
            }
        },
        None => None,
    };

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .build()?;

    let port = config.port;
    let state = AppState { db, nats, http, config: Arc::new(config) };

    let app = Router::new()
        .route(
            "/health",
            get(|| async {
                Json(serde_json::json!({"status": "healthy", "service": "souq-ecommerce"}))
            }),
        )
        .nest("/api/v1", handlers::api_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state);

    tracing::info!("🚀 Souq E-commerce listening on 0.0.0.0:{}", port);
    axum::serve(
        tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?,
        app,
    )
    .await?;
    Ok(())
}

/// Seeds the admin account from `ADMIN_USERNAME`/`ADMIN_PASSWORD` on first
/// boot. Passwords are stored as argon2 hashes, never as plaintext.
async fn ensure_admin(db: &sqlx::PgPool, config: &Config) -> Result<()> {
    let Some(password) = &config.admin_password else {
        return Ok(());
    };
    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM admins WHERE username = $1")
        .bind(&config.admin_username)
        .fetch_optional(db)
        .await?;
    if existing.is_some() {
        return Ok(());
    }
    let hash = hash_password(password)?;
    sqlx::query(
        "INSERT INTO admins (id, username, password_hash, role, created_at) \
         VALUES ($1, $2, $3, 'admin', NOW())",
    )
    .bind(Uuid::now_v7())
    .bind(&config.admin_username)
    .bind(&hash)
    .execute(db)
    .await?;
    tracing::info!(username = %config.admin_username, "seeded admin account");
    Ok(())
}
