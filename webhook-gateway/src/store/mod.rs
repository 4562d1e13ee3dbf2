//! External store access.
//!
//! The gateway needs exactly two data operations from its store: append to a
//! named list and create-key-if-absent with a TTL. Both are atomic on the
//! store side, so no in-process locking coordinates concurrent requests.

#[cfg(test)]
pub mod memory;
pub mod redis_store;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

pub use redis_store::RedisStore;

/// FIFO list plus set-if-absent key store, shared by all request tasks.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Append `payload` to the tail of the list `queue`.
    async fn push_back(&self, queue: &str, payload: &[u8]) -> Result<(), StoreError>;

    /// Create `key` with expiry `ttl` unless it exists.
    ///
    /// Returns `true` when this call created the key.
    async fn set_if_absent(&self, key: &str, ttl: Duration) -> Result<bool, StoreError>;

    /// Round-trip connectivity check.
    async fn ping(&self) -> Result<(), StoreError>;
}
