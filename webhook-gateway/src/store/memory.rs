//! In-memory store for tests, with latency and failure injection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::sleep;

use super::QueueStore;
use crate::error::StoreError;

#[derive(Default)]
struct State {
    lists: HashMap<String, Vec<Vec<u8>>>,
    keys: HashMap<String, Instant>,
}

/// Store double mirroring Redis list and `SET NX EX` semantics.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    latency: Duration,
    fail_push: AtomicBool,
    fail_set: AtomicBool,
    push_calls: AtomicUsize,
    set_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every operation by `latency`.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub fn fail_push(&self, fail: bool) {
        self.fail_push.store(fail, Ordering::SeqCst);
    }

    pub fn fail_set(&self, fail: bool) {
        self.fail_set.store(fail, Ordering::SeqCst);
    }

    pub fn push_calls(&self) -> usize {
        self.push_calls.load(Ordering::SeqCst)
    }

    pub fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }

    /// Snapshot of the list `queue`, head first.
    pub async fn entries(&self, queue: &str) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .await
            .lists
            .get(queue)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn contains_key(&self, key: &str) -> bool {
        let state = self.state.lock().await;
        state
            .keys
            .get(key)
            .is_some_and(|expires| *expires > Instant::now())
    }
}

#[async_trait]
impl QueueStore for MemoryStore {
    async fn push_back(&self, queue: &str, payload: &[u8]) -> Result<(), StoreError> {
        self.push_calls.fetch_add(1, Ordering::SeqCst);
        sleep(self.latency).await;

        if self.fail_push.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected push failure".to_string()));
        }

        let mut state = self.state.lock().await;
        state
            .lists
            .entry(queue.to_string())
            .or_default()
            .push(payload.to_vec());
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        sleep(self.latency).await;

        if self.fail_set.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected set failure".to_string()));
        }

        let mut state = self.state.lock().await;
        let now = Instant::now();
        match state.keys.get(key) {
            Some(expires) if *expires > now => Ok(false),
            _ => {
                state.keys.insert(key.to_string(), now + ttl);
                Ok(true)
            }
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_push_back_preserves_order() {
        let store = MemoryStore::new();
        store.push_back("q", b"first").await.unwrap();
        store.push_back("q", b"second").await.unwrap();

        assert_eq!(store.entries("q").await, vec![b"first".to_vec(), b"second".to_vec()]);
        assert!(store.entries("other").await.is_empty());
    }

    #[tokio::test]
    async fn test_set_if_absent_expires() {
        let store = MemoryStore::new();
        let ttl = Duration::from_millis(50);

        assert!(store.set_if_absent("k", ttl).await.unwrap());
        assert!(!store.set_if_absent("k", ttl).await.unwrap());

        sleep(Duration::from_millis(80)).await;
        assert!(store.set_if_absent("k", ttl).await.unwrap());
    }
}
