use settleup::api::{SharedService, build_app};
use settleup::config::{self, StorageBackend};
use settleup::core::engine::ExpenseSplitter;
use settleup::core::recalculation::RecomputeMode;
use settleup::infrastructure::worker::RecomputeWorker;
use settleup::{InMemoryLogging, InMemoryStorage, LedgerService, SqliteStorage, Storage, telemetry};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::config()?;
    telemetry::init(&config.log_level, config.log_format);
    info!(?config, "Configuration loaded");

    let storage: Arc<dyn Storage> = match config.storage_backend()? {
        StorageBackend::Memory => Arc::new(InMemoryStorage::new()),
        StorageBackend::SqliteMemory => Arc::new(SqliteStorage::open_in_memory()?),
        StorageBackend::SqliteFile(path) => Arc::new(SqliteStorage::open(&path)?),
    };
    let mut service = LedgerService::new(
        storage,
        InMemoryLogging::new(),
        ExpenseSplitter::new(config.split_remainder),
    );

    let worker = match config.recompute_mode {
        RecomputeMode::Inline => None,
        RecomputeMode::Deferred => {
            let handle = RecomputeWorker::spawn(service.coordinator());
            service = service.with_recompute_queue(handle.queue());
            Some(handle)
        }
    };
    let service: SharedService = Arc::new(service);

    let app = build_app(service, config.request_timeout);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(worker) = worker {
        worker.shutdown().await;
    }
    Ok(())
}
