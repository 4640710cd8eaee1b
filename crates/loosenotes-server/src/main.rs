//! Entry point for the loosenotes-server binary.

use std::sync::Arc;

use loosenotes_server::{AppState, LogFormat, ServerConfig, StorageBackend, build_app};
use loosenotes_service::{LocalFileStorage, NoteAccessService};
use loosenotes_store::{MemoryStore, PgStore, StoreConfig};
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = ServerConfig::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level, config.log_format);

    tracing::info!("Starting loosenotes-server");
    tracing::info!(
        port = config.port,
        log_level = %config.log_level,
        storage = ?config.storage_backend,
        dev_identity = config.allow_dev_identity,
        "Configuration loaded"
    );
    if config.allow_dev_identity {
        tracing::warn!("ALLOW_DEV_IDENTITY is enabled; identity headers are trusted");
    }

    let files = Arc::new(LocalFileStorage::new(config.upload_dir.clone()));
    let service = match config.storage_backend {
        StorageBackend::Postgres => {
            let store = PgStore::connect(StoreConfig::from_env()?).await?;
            tracing::info!("Connected to database");
            NoteAccessService::new(Arc::new(store), files, config.service_config())
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on shutdown");
            NoteAccessService::new(Arc::new(MemoryStore::new()), files, config.service_config())
        }
    };

    // Build application state and router
    let app = build_app(AppState::new(service, config.clone()))?;

    // Create listener
    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initialize the tracing subscriber.
fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
