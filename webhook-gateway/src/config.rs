//! Configuration module for environment variable parsing.
//!
//! Only the HMAC secret is mandatory. Every other setting has a default that
//! matches a docker-compose deployment with a `redis` service next to the
//! gateway.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::error::ConfigError;
use crate::web::signature::HmacSecret;

/// Default list the gateway appends to.
pub const DEFAULT_QUEUE_NAME: &str = "new_user_queue";

/// Default request body cap (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// How long an event id is remembered for deduplication (3 hours).
pub const DEFAULT_IDEMPOTENCY_TTL: Duration = Duration::from_secs(3 * 60 * 60);

/// Where the dedup-then-publish sequence runs relative to the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// Respond first, then deliver from a detached task.
    #[default]
    Background,
    /// Deliver before responding; publish failures become 503.
    Inline,
}

impl FromStr for DeliveryMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "background" => Ok(DeliveryMode::Background),
            "inline" => Ok(DeliveryMode::Inline),
            _ => Err(ConfigError::InvalidValue {
                name: "DELIVERY_MODE",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryMode::Background => f.write_str("background"),
            DeliveryMode::Inline => f.write_str("inline"),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared secret for HMAC-SHA512 webhook signatures
    pub hmac_secret: HmacSecret,

    /// Redis host name
    pub redis_host: String,

    /// Redis port
    pub redis_port: u16,

    /// Redis logical database index
    pub redis_db: i64,

    /// Port for the web server to listen on
    pub port: u16,

    /// Name of the Redis list payloads are appended to
    pub queue_name: String,

    /// Maximum accepted request body size in bytes
    pub max_body_bytes: usize,

    /// Deadline for a single queue append
    pub publish_timeout: Duration,

    /// Deadline for the whole post-response delivery sequence
    pub delivery_timeout: Duration,

    /// Retention window for idempotency records
    pub idempotency_ttl: Duration,

    /// Deadline for the startup connectivity check
    pub redis_connect_timeout: Duration,

    /// Whether delivery happens before or after the response
    pub delivery_mode: DeliveryMode,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Fails only when `WEBHOOK_HMAC_SECRET` is unset or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let hmac_secret = HmacSecret::from_lookup(&lookup)?;

        let delivery_mode = match lookup("DELIVERY_MODE") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(env_var = "DELIVERY_MODE", value = %raw, "Invalid delivery mode, using default");
                DeliveryMode::default()
            }),
            None => DeliveryMode::default(),
        };

        Ok(Config {
            hmac_secret,

            redis_host: lookup("REDIS_HOST")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "redis".to_string()),

            redis_port: parse_or(&lookup, "REDIS_PORT", 6379),

            redis_db: parse_or(&lookup, "REDIS_DB", 0),

            port: parse_or(&lookup, "PORT", 8080),

            queue_name: lookup("QUEUE_NAME")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_QUEUE_NAME.to_string()),

            max_body_bytes: parse_or(&lookup, "MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES),

            publish_timeout: Duration::from_millis(parse_or(&lookup, "PUBLISH_TIMEOUT_MS", 100)),

            delivery_timeout: Duration::from_millis(parse_or(&lookup, "DELIVERY_TIMEOUT_MS", 5000)),

            idempotency_ttl: Duration::from_secs(parse_or(
                &lookup,
                "IDEMPOTENCY_TTL_SECS",
                DEFAULT_IDEMPOTENCY_TTL.as_secs(),
            )),

            redis_connect_timeout: Duration::from_millis(parse_or(
                &lookup,
                "REDIS_CONNECT_TIMEOUT_MS",
                3000,
            )),

            delivery_mode,
        })
    }

    /// Connection URL for the Redis client.
    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}/{}", self.redis_host, self.redis_port, self.redis_db)
    }
}

/// Parse a variable, falling back to `default` when unset or malformed.
fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(raw) = lookup(name) else {
        return default;
    };

    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}
