//! Queue module for Redis operations.
//!
//! This module provides:
//! - Async publisher that appends raw payloads to the inbound list
//! - Idempotency guard that drops redelivered events
//! - The dedup-then-publish delivery sequence
//!
//! ## Architecture
//!
//! ```text
//! Web Server → IdempotencyGuard (SET NX) → Publisher (RPUSH new_user_queue) → Workers
//! ```

pub mod delivery;
pub mod idempotency;
pub mod publisher;

pub use delivery::{DeliveryOutcome, Dispatcher};
pub use idempotency::{extract_event_id, idempotency_key, IdempotencyGuard, IDEMPOTENCY_KEY_PREFIX};
pub use publisher::Publisher;
