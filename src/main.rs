mod access;
mod auth;
mod category;
mod dashboard;
mod db;
mod error;
mod input;
mod mail;
mod middleware;
mod notification;
mod pagination;
mod reminder;
mod routes;
mod state;
mod task;
mod user;

use anyhow::Context;
use auth::start_token_cleanup;
use db::{create_pool, run_migrations};
use mail::mailer_from_backend;
use routes::create_router;
use state::{AppState, Config};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,task_reminders=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env()?);

    tracing::info!("Connecting to database...");
    let db = create_pool(&config.database_url)
        .await
        .context("failed to connect to database")?;

    tracing::info!("Running migrations...");
    run_migrations(&db).await.context("failed to run migrations")?;

    let mailer = mailer_from_backend(&config.mail_backend);
    let state = AppState::new(db, config.clone(), mailer);

    // Purge expired refresh tokens hourly
    let _scheduler = match start_token_cleanup(state.refresh_token_repository.clone()).await {
        Ok(scheduler) => Some(scheduler),
        Err(e) => {
            tracing::error!("Failed to start token cleanup job: {:?}", e);
            None
        }
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
