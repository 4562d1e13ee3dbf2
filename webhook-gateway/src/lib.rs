//! Webhook Gateway - authenticated webhook ingestion.
//!
//! Receives webhook notifications over HTTP, verifies their HMAC-SHA512
//! signature, acknowledges immediately and appends the raw payload to a Redis
//! list for downstream workers. Redelivered events carrying the same `id` are
//! dropped before they reach the queue.
//!
//! ## Architecture
//!
//! ```text
//! Webhooks → Web Server → (ack 200) → IdempotencyGuard → Publisher → new_user_queue → Workers
//! ```

pub mod config;
pub mod error;
pub mod queue;
pub mod store;
pub mod web;

// Re-export commonly used types
pub use config::{Config, DeliveryMode};
pub use error::{ConfigError, ExtractError, GuardError, PublishError, StoreError};
pub use queue::{extract_event_id, DeliveryOutcome, Dispatcher, IdempotencyGuard, Publisher};
pub use store::{QueueStore, RedisStore};
pub use web::{AppState, SignatureVerifier};
