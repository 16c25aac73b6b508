use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trivia_board::{
    api,
    auth::AdminAuthConfig,
    board::BoardConfig,
    config::ServerConfig,
    state::AppState,
    store::{snapshot::StoreSnapshot, MemoryStore},
    tasks,
};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trivia_board=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting trivia board service...");

    let server_config = ServerConfig::from_env();
    let board_config = BoardConfig::from_env();
    let auth_config = Arc::new(AdminAuthConfig::from_env());

    let store = Arc::new(MemoryStore::new());
    if let Some(path) = &server_config.seed_file {
        match StoreSnapshot::load_file(path) {
            Ok(snapshot) => {
                if let Err(e) = store.import_snapshot(snapshot).await {
                    tracing::error!("Failed to import seed file {}: {}", path.display(), e);
                    std::process::exit(1);
                }
            }
            Err(e) => {
                tracing::error!("Failed to load seed file {}: {}", path.display(), e);
                std::process::exit(1);
            }
        }
    }

    let state = Arc::new(AppState::with_store(store, board_config));

    if let Some(cache) = &state.cache {
        tasks::spawn_cache_purger(cache.clone(), server_config.cache_purge_interval);
    }

    let app = api::router(state, auth_config)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    tracing::info!("Listening on http://{}", server_config.bind_addr);

    let listener = match tokio::net::TcpListener::bind(server_config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", server_config.bind_addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
