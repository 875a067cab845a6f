use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use rust_redis_stats::config::{Backend, Config};
use rust_redis_stats::store::{MemoryStore, MetricStore, RedisStore};
use rust_redis_stats::{logging, server, AppState};

/// How often the in-memory backend drops expired partitions.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = Config::parse();
    logging::init(&config)?;

    // ── 1. Open the store ────────────────────────────────────────
    let store: Arc<dyn MetricStore> = match config.backend {
        Backend::Redis => {
            info!(url = %config.redis_url, "connecting to redis");
            Arc::new(RedisStore::connect(&config.redis_url).await?)
        }
        Backend::Memory => {
            info!("using in-memory store; data is lost on exit");
            let store = Arc::new(MemoryStore::new());
            // Detached; runs for the life of the process
            let _sweeper = store.start_ttl_cleanup(SWEEP_INTERVAL);
            store
        }
    };

    // ── 2. Build shared state & router ───────────────────────────
    let state = Arc::new(AppState::new(store));
    let app = server::create_router(state);

    // ── 3. Bind & serve ──────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(config.listen).await?;
    info!(addr = %config.listen, "listening");
    info!("buckets → http://{}/api/buckets", config.listen);
    info!("metrics → http://{}/api/metrics", config.listen);

    axum::serve(listener, app).await?;
    Ok(())
}
