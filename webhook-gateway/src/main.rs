//! Webhook Gateway - high-performance webhook receiver.
//!
//! This binary provides a thin, fast web server that:
//! - Receives webhooks on `POST /webhook`
//! - Verifies the `X-Webhook-Hmac` signature
//! - Returns 200 OK immediately
//! - Deduplicates and enqueues the raw payload to Redis in the background

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gateway::web::router;
use gateway::{AppState, Config, RedisStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("gateway_starting");

    // Load configuration; a missing secret aborts startup
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        port = config.port,
        redis_host = %config.redis_host,
        redis_port = config.redis_port,
        queue = %config.queue_name,
        max_body_bytes = config.max_body_bytes,
        delivery_mode = %config.delivery_mode,
        idempotency_ttl_secs = config.idempotency_ttl.as_secs(),
        "config_loaded"
    );

    // Connect to Redis; an unreachable store aborts startup
    let store = RedisStore::connect(&config.redis_url(), config.redis_connect_timeout)
        .await
        .context("Failed to connect to Redis")?;

    let state = AppState::from_config(&config, Arc::new(store));
    let app = router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "gateway_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("gateway_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!(signal = "SIGINT", "gateway_signal_received"),
        _ = terminate => info!(signal = "SIGTERM", "gateway_signal_received"),
    }

    info!("gateway_shutting_down");
}
