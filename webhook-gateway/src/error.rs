//! Error types for the gateway.
//!
//! Startup errors (`ConfigError`, `StoreError` at boot) are fatal. Everything
//! raised after the caller has been acknowledged is logged and dropped.

use std::time::Duration;

use thiserror::Error;

/// Configuration errors raised while loading from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("WEBHOOK_HMAC_SECRET is not set or is empty")]
    MissingSecret,

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Failures talking to the external key-value/list store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store command failed: {0}")]
    Command(#[from] redis::RedisError),

    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Queue append failures.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("queue unavailable: {0}")]
    Unavailable(#[source] StoreError),
}

/// Reasons an event identifier could not be read from a payload.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("payload is not valid JSON: {0}")]
    Unparseable(String),

    #[error("payload has no non-empty string `id` field")]
    MissingId,
}

/// Idempotency store failures.
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("idempotency store unavailable: {0}")]
    Unavailable(#[source] StoreError),
}
