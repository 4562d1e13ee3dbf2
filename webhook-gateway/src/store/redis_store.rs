//! Redis-backed store using a single multiplexed connection.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tokio::time::timeout;
use tracing::info;

use super::QueueStore;
use crate::error::StoreError;

/// Redis store client.
///
/// Clones share one connection manager, which multiplexes commands from any
/// number of tasks and reconnects after connection loss.
#[derive(Clone)]
pub struct RedisStore {
    manager: ConnectionManager,
}

impl RedisStore {
    /// Connect to `url` and verify the connection with `PING`.
    ///
    /// Both steps together must finish within `connect_timeout`.
    pub async fn connect(url: &str, connect_timeout: Duration) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;

        info!(
            timeout_ms = connect_timeout.as_millis() as u64,
            "redis_connecting"
        );

        let store = timeout(connect_timeout, async {
            let manager = ConnectionManager::new(client).await?;
            let store = Self { manager };
            store.ping().await?;
            Ok::<_, StoreError>(store)
        })
        .await
        .map_err(|_| StoreError::Timeout(connect_timeout))??;

        info!("redis_connected");

        Ok(store)
    }
}

#[async_trait]
impl QueueStore for RedisStore {
    async fn push_back(&self, queue: &str, payload: &[u8]) -> Result<(), StoreError> {
        let mut conn = self.manager.clone();

        let _len: i64 = redis::cmd("RPUSH")
            .arg(queue)
            .arg(payload)
            .query_async(&mut conn)
            .await?;

        Ok(())
    }

    async fn set_if_absent(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let mut conn = self.manager.clone();

        // SET key 1 NX EX <secs> replies OK when created and nil otherwise
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg("1")
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await?;

        Ok(reply.is_some())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.manager.clone();

        let reply: String = redis::cmd("PING").query_async(&mut conn).await?;
        if reply != "PONG" {
            return Err(StoreError::Unavailable(format!("unexpected PING reply: {reply}")));
        }

        Ok(())
    }
}
