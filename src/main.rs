//! PayDhan Backend Service
//!
//! Main entry point for the PayDhan expense tracker backend.
//! This service provides:
//! - JSON HTTP API for personal payments, categories and reports
//! - Group expense splitting, settlement and chat
//! - Background cleanup of the in-memory rate limiter

use paydhan_backend::api::build_router;
use paydhan_backend::database::{create_pool, run_migrations};
use paydhan_backend::error::{AppError, AppResult};
use paydhan_backend::{AppConfig, AppState};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// How often stale rate limiter entries are swept
const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "paydhan_backend={},sqlx=warn,tower_http=info",
            config.log_level
        )
        .into()
    });

    if config.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        AppError::Config(e)
    })?;

    init_tracing(&config);

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║           PayDhan Backend Service Starting                ║");
    info!("╚══════════════════════════════════════════════════════════╝");
    info!("Environment: {}", config.environment);
    info!("Log level: {}", config.log_level);
    info!("HTTP port: {}", config.http_port);
    if config.session.uses_dev_secret() {
        warn!("JWT_SECRET not set, using development secret");
    }
    if config.google.is_none() {
        warn!("Google sign-in disabled (GOOGLE_CLIENT_ID / GOOGLE_CLIENT_SECRET / GOOGLE_REDIRECT_URI not set)");
    }

    // =========================================================================
    // DATABASE SETUP
    // =========================================================================
    info!("Connecting to database...");

    let pool = create_pool(&config.database).await.map_err(|e| {
        error!("Failed to create database pool: {}", e);
        AppError::Database(e)
    })?;

    info!("Database connection pool created successfully");
    info!("Max connections: {}", config.database.max_connections);

    info!("Running database migrations...");
    run_migrations(&pool).await.map_err(|e| {
        error!("Database migration failed: {}", e);
        AppError::Database(e)
    })?;

    info!("Database migrations completed successfully");

    // =========================================================================
    // CORE SERVICES INITIALIZATION
    // =========================================================================
    let http_port = config.http_port;
    let environment = config.environment.clone();

    let state = AppState::new(pool, config);
    info!("✓ Application state initialized with repositories and services");

    // =========================================================================
    // BACKGROUND TASKS
    // =========================================================================
    let limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(RATE_LIMIT_CLEANUP_INTERVAL);
        loop {
            ticker.tick().await;
            limiter.cleanup().await;
        }
    });
    info!("✓ Rate limiter cleanup task started (5m interval)");

    // =========================================================================
    // START SERVER
    // =========================================================================
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], http_port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Message(format!("Failed to bind HTTP server: {}", e)))?;

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║           PayDhan Backend Service Ready!                  ║");
    info!("╠══════════════════════════════════════════════════════════╣");
    info!("║  HTTP API:     0.0.0.0:{}                              ║", http_port);
    info!("║  Environment:  {}                                    ║", environment);
    info!("╚══════════════════════════════════════════════════════════╝");
    info!("Press Ctrl+C to shutdown gracefully");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| AppError::Message(format!("HTTP server error: {}", e)))?;

    info!("PayDhan backend service shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Shutdown signal received, shutting down gracefully..."),
        _ = terminate => info!("SIGTERM received, shutting down gracefully..."),
    }
}
