use std::sync::Arc;

use crate::board::{BoardConfig, BoardEngine};
use crate::store::snapshot::StoreSnapshot;
use crate::store::{CacheStore, MemoryCache, MemoryStore, NullCache};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: BoardEngine,
    /// Backing store, kept concrete for snapshot import/export
    pub store: Arc<MemoryStore>,
    /// Present when caching is enabled, so it can be purged periodically
    pub cache: Option<Arc<MemoryCache>>,
}

impl AppState {
    pub fn new(config: BoardConfig) -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), config)
    }

    pub fn with_store(store: Arc<MemoryStore>, config: BoardConfig) -> Self {
        let cache = config.cache_enabled.then(|| Arc::new(MemoryCache::new()));
        let cache_store: Arc<dyn CacheStore> = match &cache {
            Some(cache) => cache.clone(),
            None => Arc::new(NullCache),
        };
        let engine = BoardEngine::new(store.clone(), store.clone(), cache_store, config);
        Self {
            engine,
            store,
            cache,
        }
    }

    /// Replace all store contents, then drop every cached board. Game ids
    /// from the snapshot may name different games than the cached ones.
    pub async fn import_snapshot(&self, snapshot: StoreSnapshot) -> Result<(), String> {
        self.store.import_snapshot(snapshot).await?;
        if let Some(cache) = &self.cache {
            let dropped = cache.clear().await;
            tracing::info!("Cleared {} cached boards after import", dropped);
        }
        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(BoardConfig::default())
    }
}
