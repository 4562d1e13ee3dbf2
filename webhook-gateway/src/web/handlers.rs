//! Webhook endpoint handlers.
//!
//! The webhook handler is designed to be extremely fast - it only:
//! 1. Reads the body under a hard size cap
//! 2. Verifies the HMAC signature
//! 3. Returns 200 and hands the payload to a background delivery task
//!
//! Deduplication and the queue append never block the response in the
//! default delivery mode.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::{Config, DeliveryMode};
use crate::queue::{DeliveryOutcome, Dispatcher, IdempotencyGuard, Publisher};
use crate::store::QueueStore;
use crate::web::signature::{SignatureVerifier, SIGNATURE_HEADER};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub verifier: SignatureVerifier,
    pub dispatcher: Dispatcher,
    pub delivery_mode: DeliveryMode,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(
        verifier: SignatureVerifier,
        dispatcher: Dispatcher,
        delivery_mode: DeliveryMode,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            verifier,
            dispatcher,
            delivery_mode,
            max_body_bytes,
        }
    }

    /// Wire the verifier, guard, publisher and dispatcher around one store.
    pub fn from_config(config: &Config, store: Arc<dyn QueueStore>) -> Self {
        let verifier = SignatureVerifier::new(config.hmac_secret.clone());
        let guard = IdempotencyGuard::new(Arc::clone(&store), config.idempotency_ttl);
        let publisher = Publisher::new(store, config.queue_name.as_str(), config.publish_timeout);
        let dispatcher = Dispatcher::new(guard, publisher, config.delivery_timeout);

        Self::new(
            verifier,
            dispatcher,
            config.delivery_mode,
            config.max_body_bytes,
        )
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Webhook
// =============================================================================

/// Webhook endpoint.
///
/// Status codes:
/// - 200: accepted (queued, or queued later in background mode)
/// - 400: body could not be read
/// - 403: signature missing or invalid
/// - 413: body over the size cap
/// - 503: queue append failed (inline mode only)
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> StatusCode {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            let status = rejection.status();
            warn!(
                status = status.as_u16(),
                error = %rejection.body_text(),
                "webhook_body_rejected"
            );
            return status;
        }
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty());

    info!(
        body_length = body.len(),
        has_signature = signature.is_some(),
        "webhook_received"
    );

    let Some(signature) = signature else {
        warn!("webhook_signature_missing");
        return StatusCode::FORBIDDEN;
    };

    if !state.verifier.validate(&body, signature) {
        warn!(body_length = body.len(), "webhook_signature_invalid");
        return StatusCode::FORBIDDEN;
    }

    match state.delivery_mode {
        DeliveryMode::Background => {
            // Detached: the task outlives this request and is never joined
            state.dispatcher.spawn(body);
            info!("webhook_accepted");
            StatusCode::OK
        }
        // Awaited but still spawned: a sender disconnect drops this future,
        // and the delivery must not stop between claiming the id and the append
        DeliveryMode::Inline => match state.dispatcher.spawn(body).await {
            Ok(DeliveryOutcome::Published | DeliveryOutcome::Duplicate) => {
                info!("webhook_accepted");
                StatusCode::OK
            }
            Ok(DeliveryOutcome::Failed) => StatusCode::SERVICE_UNAVAILABLE,
            Err(e) => {
                error!(error = %e, "delivery_task_failed");
                StatusCode::SERVICE_UNAVAILABLE
            }
        },
    }
}
