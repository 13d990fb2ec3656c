//! Visit counting backends.
//!
//! The authoritative backend is Redis: one `INCR` per request against the key
//! `visits:<client-id>`, which creates the key at zero when absent and is
//! atomic at the store, so concurrent requests for the same client never race.
//! When Redis is unreachable the process degrades to [`MemoryVisits`], an
//! in-process map that is lost on restart and not shared across instances.

use crate::identity::ClientId;
use async_trait::async_trait;
use parking_lot::Mutex;
use redis::{aio::MultiplexedConnection, AsyncCommands};
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;

const KEY_PREFIX: &str = "visits:";

/// Error from the external visit store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redis command failed: {0}")]
    Redis(#[from] redis::RedisError),
}

/// A durable counter backend.
#[async_trait]
pub trait VisitStore: Send + Sync {
    /// Atomically increments the visit count for `id`, creating it at zero
    /// first when absent, and returns the post-increment value.
    async fn increment(&self, id: &ClientId) -> Result<u64, StoreError>;
}

/// Redis-backed [`VisitStore`].
#[derive(Clone)]
pub struct RedisVisits {
    conn: MultiplexedConnection,
}

impl RedisVisits {
    /// Connects to Redis at `url` and verifies the connection with a `PING`.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let mut conn = client.get_multiplexed_tokio_connection().await?;
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl VisitStore for RedisVisits {
    async fn increment(&self, id: &ClientId) -> Result<u64, StoreError> {
        // The multiplexed connection is cheap to clone and pipelines
        // commands from concurrent tasks over one socket.
        let mut conn = self.conn.clone();
        let count = conn.incr(format!("{KEY_PREFIX}{id}"), 1u64).await?;
        Ok(count)
    }
}

/// In-process counter used while Redis is unreachable. Increments are
/// serialized by the mutex so concurrent requests never lose updates.
#[derive(Debug, Default)]
pub struct MemoryVisits {
    counts: Mutex<HashMap<ClientId, u64>>,
}

impl MemoryVisits {
    pub fn increment(&self, id: &ClientId) -> u64 {
        let mut counts = self.counts.lock();
        let count = counts.entry(id.clone()).or_insert(0);
        *count += 1;
        *count
    }
}

/// The per-process counter: a primary store when the startup connectivity
/// check succeeded, plus the in-memory fallback.
pub struct VisitCounter {
    primary: Option<Arc<dyn VisitStore>>,
    fallback: MemoryVisits,
}

impl VisitCounter {
    /// Counter backed by `store`, falling back per request on store errors.
    pub fn store_backed(store: Arc<dyn VisitStore>) -> Self {
        Self {
            primary: Some(store),
            fallback: MemoryVisits::default(),
        }
    }

    /// Counter for a process whose store was unreachable at startup.
    pub fn fallback_only() -> Self {
        Self {
            primary: None,
            fallback: MemoryVisits::default(),
        }
    }

    /// Records one visit for `id` and returns the resulting count.
    ///
    /// A store error is logged and that single request is counted in memory;
    /// the next call tries the store again. No error reaches the caller.
    pub async fn record(&self, id: &ClientId) -> u64 {
        if let Some(store) = &self.primary {
            match store.increment(id).await {
                Ok(count) => return count,
                Err(err) => {
                    tracing::warn!("visit store error, counting this request in memory: {err}")
                }
            }
        }
        self.fallback.increment(id)
    }
}
