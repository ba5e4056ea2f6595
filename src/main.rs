use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hostwatch::adapters::{MemoryEngine, RedbEngine};
use hostwatch::application::SnapshotStore;
use hostwatch::config::{Config, StorageKind};
use hostwatch::interface::http::create_router;
use hostwatch::ports::KvEngine;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("hostwatch={},tower_http=info", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting hostwatch v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {:?}", config);

    let engine: Arc<dyn KvEngine> = match config.storage {
        StorageKind::Redb => {
            let engine = RedbEngine::open(&config.data_dir)?;
            info!("✓ Opened snapshot database at {}", config.data_dir.display());
            Arc::new(engine)
        }
        StorageKind::Memory => {
            info!("✓ Using in-memory snapshot storage, data is lost on exit");
            Arc::new(MemoryEngine::new())
        }
    };

    let store = SnapshotStore::new(engine, &config.namespaces);

    // Create HTTP server
    let app = create_router(store);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("✓ hostwatch listening on {}", addr);
    info!("  → API: http://localhost:{}/api/snapshots/daily", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
