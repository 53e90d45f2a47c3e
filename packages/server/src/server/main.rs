// Main entry point for the grid server

use std::sync::Arc;

use anyhow::{Context, Result};
use grid_core::domains::squares::{MemorySquareStore, PostgresSquareStore, SquareStore};
use grid_core::server::{build_app, AppState};
use grid_core::Config;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,grid_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Grid Squares rotation service");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        squares_per_page = config.layout.squares_per_page(),
        pages = config.layout.page_count(),
        "Configuration loaded"
    );

    let store: Arc<dyn SquareStore> = match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Database connected");

            tracing::info!("Running database migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run migrations")?;
            tracing::info!("Migrations complete");

            Arc::new(PostgresSquareStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store (state is lost on restart)");
            Arc::new(MemorySquareStore::new())
        }
    };

    if config.admin_api_key.is_none() {
        tracing::warn!("ADMIN_API_KEY not set, admin endpoints will refuse requests");
    }

    let state = AppState::new(store, config.layout, config.rotation_interval);

    // Start the rotation scheduler
    let shutdown = CancellationToken::new();
    let scheduler_handle = tokio::spawn(state.scheduler.clone().run(shutdown.clone()));

    let app = build_app(state, config.admin_api_key.clone());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
            server_shutdown.cancel();
        })
        .await
        .context("Server error")?;

    shutdown.cancel();
    let _ = scheduler_handle.await;

    Ok(())
}
