use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default listen address
const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 8000);

/// Process-level settings for the HTTP server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Snapshot file loaded into the store at startup
    pub seed_file: Option<PathBuf>,
    /// How often expired cache entries are purged
    pub cache_purge_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(DEFAULT_BIND_ADDR),
            seed_file: None,
            cache_purge_interval: Duration::from_secs(60),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let bind_addr = match std::env::var("BIND_ADDR") {
            Ok(raw) => raw.trim().parse().unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid BIND_ADDR {:?}: {}", raw, e);
                SocketAddr::from(DEFAULT_BIND_ADDR)
            }),
            Err(_) => SocketAddr::from(DEFAULT_BIND_ADDR),
        };

        let seed_file = std::env::var("SEED_FILE").ok().and_then(|path| {
            let trimmed = path.trim();
            (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
        });

        let cache_purge_interval = std::env::var("CACHE_PURGE_SECS")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(60));

        Self {
            bind_addr,
            seed_file,
            cache_purge_interval,
        }
    }
}
