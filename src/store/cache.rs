use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;

use super::CacheStore;
use crate::error::CacheError;
use crate::types::QuestionId;

/// TTL-bounded in-process cache
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    /// Map of key to (value, expiry)
    entries: Arc<RwLock<HashMap<String, (Vec<QuestionId>, Instant)>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop expired entries (call periodically)
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        before - entries.len()
    }

    /// Drop every entry. Returns how many were held.
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.write().await;
        let count = entries.len();
        entries.clear();
        count
    }

    /// Number of entries currently held, expired or not
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<QuestionId>>, CacheError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some((value, expires_at)) if *expires_at > now => return Ok(Some(value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Expired: evict so stale fingerprints don't pile up
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|(_, expires_at)| *expires_at <= now) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<QuestionId>, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = Instant::now() + ttl;
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value, expires_at));
        Ok(())
    }
}

/// Cache that never holds anything; used when caching is disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCache;

#[async_trait]
impl CacheStore for NullCache {
    async fn get(&self, _key: &str) -> Result<Option<Vec<QuestionId>>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: Vec<QuestionId>, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }
}
