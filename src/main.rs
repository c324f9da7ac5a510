//! easybook server entry point.
//!
//! Starts the Axum HTTP server with the JSON API and the HTML page
//! adapters, after running the startup store maintenance pass.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use easybook::api;
use easybook::app_state::AppState;
use easybook::config::AppConfig;
use easybook::persistence::Store;
use easybook::session::SessionManager;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = AppConfig::from_env()?;
    tracing::info!(port = config.port, env = %config.app_env, "starting easybook");

    // Connect the store and bring the schema up to date
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await?;
    let store = Store::new(pool);
    store.ensure_startup_maintenance().await?;

    // Session boundary
    let sessions = SessionManager::new(
        store.clone(),
        config.is_production(),
        &config.session_secret,
    )?;

    let port = config.port;
    let state = AppState::new(config, store.clone(), sessions);

    // Expired presence leases and sessions are swept in the background;
    // reads never depend on the sweep because they filter on expires_at.
    tokio::spawn(expiry_sweep(store));

    // Build router
    let app = api::build_router(state)
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http());

    // Start server
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

/// Periodically deletes expired presence and session rows.
async fn expiry_sweep(store: Store) {
    let mut interval = tokio::time::interval(Duration::from_secs(60));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        if let Err(err) = store.delete_expired_presence().await {
            tracing::warn!(error = %err, "presence expiry sweep failed");
        }
        if let Err(err) = store.delete_expired_sessions().await {
            tracing::warn!(error = %err, "session expiry sweep failed");
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install shutdown handler");
    }
    tracing::info!("shutdown signal received");
}
