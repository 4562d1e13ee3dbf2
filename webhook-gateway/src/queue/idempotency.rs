//! Duplicate delivery suppression.
//!
//! Webhook senders redeliver on timeouts, so the same event can arrive more
//! than once. The first sighting of an event id claims a short-lived key in
//! the store; later deliveries with the same id find the key and are dropped.
//!
//! Payloads without an id (status and read-receipt notifications, for
//! example) bypass the guard entirely.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::error::{ExtractError, GuardError};
use crate::store::QueueStore;

/// Prefix of every idempotency key.
pub const IDEMPOTENCY_KEY_PREFIX: &str = "idempotency:event:";

/// Store key marking `event_id` as seen.
pub fn idempotency_key(event_id: &str) -> String {
    format!("{IDEMPOTENCY_KEY_PREFIX}{event_id}")
}

/// Read the top-level `id` of a JSON payload.
///
/// Only a non-empty string `id` on a JSON object counts. Callers must treat
/// an error as "skip deduplication", never as a rejection.
pub fn extract_event_id(payload: &[u8]) -> Result<String, ExtractError> {
    let value: Value =
        serde_json::from_slice(payload).map_err(|e| ExtractError::Unparseable(e.to_string()))?;

    match value.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(ExtractError::MissingId),
    }
}

/// Claims event ids in the store with set-if-absent.
#[derive(Clone)]
pub struct IdempotencyGuard {
    store: Arc<dyn QueueStore>,
    ttl: Duration,
}

impl IdempotencyGuard {
    pub fn new(store: Arc<dyn QueueStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Mark `event_id` as seen for the guard's retention window.
    ///
    /// Returns `true` when the id was already seen.
    pub async fn check_and_set(&self, event_id: &str) -> Result<bool, GuardError> {
        self.check_and_set_with_ttl(event_id, self.ttl).await
    }

    /// Mark `event_id` as seen for `ttl`.
    ///
    /// Returns `true` when the id was already seen.
    pub async fn check_and_set_with_ttl(
        &self,
        event_id: &str,
        ttl: Duration,
    ) -> Result<bool, GuardError> {
        let key = idempotency_key(event_id);

        let created = self
            .store
            .set_if_absent(&key, ttl)
            .await
            .map_err(GuardError::Unavailable)?;

        debug!(event_id = %event_id, created, "idempotency_checked");

        Ok(!created)
    }
}
