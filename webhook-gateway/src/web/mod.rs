//! Web server module for handling inbound webhooks.
//!
//! This module provides a thin, fast web server that:
//! - Bounds and reads the request body
//! - Verifies the HMAC signature
//! - Acknowledges immediately and delivers the raw payload in the background
//!
//! All interpretation of the payload happens in downstream workers.

pub mod handlers;
pub mod signature;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{health, webhook, AppState, HealthResponse};
pub use signature::{HmacSecret, SignatureVerifier, SIGNATURE_HEADER};

/// Path of the webhook route.
pub const WEBHOOK_PATH: &str = "/webhook";

/// Build the gateway router.
///
/// Only `POST` is routed to the webhook, so other methods get 405.
pub fn router(state: AppState) -> Router {
    let body_limit = state.max_body_bytes;

    Router::new()
        .route("/health", get(health))
        .route(WEBHOOK_PATH, post(webhook))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
