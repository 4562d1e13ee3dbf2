//! Async publisher for enqueueing raw webhook payloads.
//!
//! The publisher shares the process-wide store client and can be cloned into
//! any number of request or background tasks.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::info;

use crate::error::{PublishError, StoreError};
use crate::store::QueueStore;

/// Appends payloads to the tail of one named queue.
///
/// Each append is bounded by a deadline so a slow or unreachable store
/// cannot stall the caller. Failed appends are not retried.
#[derive(Clone)]
pub struct Publisher {
    store: Arc<dyn QueueStore>,
    queue: Arc<str>,
    deadline: Duration,
}

impl Publisher {
    /// Create a publisher for `queue` with a default per-append `deadline`.
    pub fn new(store: Arc<dyn QueueStore>, queue: impl Into<Arc<str>>, deadline: Duration) -> Self {
        Self {
            store,
            queue: queue.into(),
            deadline,
        }
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Append `payload` using the default deadline.
    pub async fn publish(&self, payload: &[u8]) -> Result<(), PublishError> {
        self.publish_with_deadline(payload, self.deadline).await
    }

    /// Append `payload` verbatim, giving up after `deadline`.
    pub async fn publish_with_deadline(
        &self,
        payload: &[u8],
        deadline: Duration,
    ) -> Result<(), PublishError> {
        match timeout(deadline, self.store.push_back(&self.queue, payload)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(PublishError::Unavailable(e)),
            Err(_) => return Err(PublishError::Unavailable(StoreError::Timeout(deadline))),
        }

        info!(
            queue = %self.queue,
            body_length = payload.len(),
            "queue_published"
        );

        Ok(())
    }
}
