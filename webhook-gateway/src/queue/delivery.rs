//! Post-authentication delivery: deduplicate, then publish.
//!
//! Every step here is best effort. Failures are logged and resolved by
//! failing open:
//! - no usable event id → publish without deduplication
//! - idempotency store error → publish anyway (downstream consumers already
//!   handle at-least-once delivery)
//! - publish error → logged and dropped, never retried

use std::time::Duration;

use axum::body::Bytes;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{error, info, warn};

use super::idempotency::{extract_event_id, IdempotencyGuard};
use super::publisher::Publisher;

/// Result of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The payload was appended to the queue.
    Published,
    /// The event id was already seen; nothing was appended.
    Duplicate,
    /// The append failed or the delivery deadline passed.
    Failed,
}

/// Runs the dedup-then-publish sequence.
#[derive(Clone)]
pub struct Dispatcher {
    guard: IdempotencyGuard,
    publisher: Publisher,
    deadline: Duration,
}

impl Dispatcher {
    /// `deadline` bounds a whole delivery, guard and publish together.
    pub fn new(guard: IdempotencyGuard, publisher: Publisher, deadline: Duration) -> Self {
        Self {
            guard,
            publisher,
            deadline,
        }
    }

    /// Deliver `payload` from a detached task.
    ///
    /// The task owns its payload and deadline. Dropping the returned handle,
    /// or cancelling whatever spawned it, does not cancel the delivery.
    pub fn spawn(&self, payload: Bytes) -> JoinHandle<DeliveryOutcome> {
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.deliver_within_deadline(&payload).await })
    }

    /// Deliver `payload`, giving up once the delivery deadline passes.
    pub async fn deliver_within_deadline(&self, payload: &[u8]) -> DeliveryOutcome {
        match timeout(self.deadline, self.deliver(payload)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                error!(
                    deadline_ms = self.deadline.as_millis() as u64,
                    body_length = payload.len(),
                    "delivery_timed_out"
                );
                DeliveryOutcome::Failed
            }
        }
    }

    /// Deliver `payload` with no overall deadline.
    pub async fn deliver(&self, payload: &[u8]) -> DeliveryOutcome {
        match extract_event_id(payload) {
            Err(e) => {
                warn!(error = %e, "event_id_unavailable_skipping_dedup");
            }
            Ok(event_id) => match self.guard.check_and_set(&event_id).await {
                Ok(true) => {
                    info!(event_id = %event_id, "duplicate_event_discarded");
                    return DeliveryOutcome::Duplicate;
                }
                Ok(false) => {
                    info!(event_id = %event_id, "unique_event_accepted");
                }
                Err(e) => {
                    error!(event_id = %event_id, error = %e, "idempotency_check_failed_publishing");
                }
            },
        }

        match self.publisher.publish(payload).await {
            Ok(()) => DeliveryOutcome::Published,
            Err(e) => {
                error!(
                    queue = %self.publisher.queue(),
                    body_length = payload.len(),
                    error = %e,
                    "queue_publish_failed"
                );
                DeliveryOutcome::Failed
            }
        }
    }
}
