//! Redis implementations of the cache gateway and moderation store
//!
//! Shares one connection manager across both. Cache entries are JSON with a
//! jittered TTL to avoid thundering herd; a corrupted entry is deleted and
//! reported as a miss. Moderation keys are plain SETs with no TTL.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::dto::FeedPageDto;
use crate::error::{EngineError, EngineResult};
use crate::gateway::{CacheEntry, CacheGateway, ModerationStore};

/// Shared Redis connection manager
pub type SharedRedis = Arc<Mutex<ConnectionManager>>;

/// Open a shared connection manager for the gateway pair
pub async fn connect(url: &str) -> EngineResult<SharedRedis> {
    let client = redis::Client::open(url)?;
    let manager = ConnectionManager::new(client).await?;
    Ok(Arc::new(Mutex::new(manager)))
}

pub struct RedisCacheGateway {
    redis: SharedRedis,
}

impl RedisCacheGateway {
    pub fn new(redis: SharedRedis) -> Self {
        Self { redis }
    }

    /// Add jitter to TTL to prevent thundering herd
    fn add_jitter(ttl_secs: u64) -> u64 {
        let jitter_percent = (rand::random::<u32>() % 10) as f64 / 100.0;
        let jitter = (ttl_secs as f64 * jitter_percent).round() as u64;
        ttl_secs + jitter
    }
}

#[async_trait]
impl CacheGateway for RedisCacheGateway {
    async fn get(&self, key: &str) -> EngineResult<Option<CacheEntry>> {
        let mut conn = self.redis.lock().await;
        let raw: Option<String> = conn.get(key).await?;

        match raw {
            Some(data) => match serde_json::from_str::<CacheEntry>(&data) {
                Ok(entry) => {
                    debug!(key = %key, "cache hit");
                    Ok(Some(entry))
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "cache deserialization failed");
                    // Delete corrupted cache entry
                    let _ = conn.del::<_, ()>(key).await;
                    Ok(None)
                }
            },
            None => {
                debug!(key = %key, "cache miss");
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, payload: &FeedPageDto, ttl: Duration) -> EngineResult<()> {
        let entry = CacheEntry {
            payload: payload.clone(),
            timestamp: Utc::now(),
        };
        let data = serde_json::to_string(&entry)?;
        let ttl_secs = Self::add_jitter(ttl.as_secs());

        let mut conn = self.redis.lock().await;
        conn.set_ex::<_, _, ()>(key, data, ttl_secs).await?;

        debug!(key = %key, ttl = ttl_secs, "cache set");
        Ok(())
    }
}

pub struct RedisModerationStore {
    redis: SharedRedis,
}

impl RedisModerationStore {
    pub fn new(redis: SharedRedis) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl ModerationStore for RedisModerationStore {
    async fn load(&self, key: &str) -> EngineResult<Option<HashSet<String>>> {
        let mut conn = self.redis.lock().await;
        let raw: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| EngineError::Storage(e.to_string()))?;

        match raw {
            Some(data) => match serde_json::from_str::<HashSet<String>>(&data) {
                Ok(set) => Ok(Some(set)),
                Err(e) => {
                    warn!(key = %key, error = %e, "moderation set deserialization failed");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn save(&self, key: &str, ids: &HashSet<String>) -> EngineResult<()> {
        let data = serde_json::to_string(ids)?;
        let mut conn = self.redis.lock().await;
        conn.set::<_, _, ()>(key, data)
            .await
            .map_err(|e| EngineError::Storage(e.to_string()))?;

        debug!(key = %key, count = ids.len(), "moderation set saved");
        Ok(())
    }
}
