//! Local Cache - HTTP service over the cache manager

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use local_cache::api::{create_router, AppState};
use local_cache::config::Config;
use local_cache::tasks::spawn_maintenance_task;

/// Startup: logging, configuration, storage and cache, an initial sweep,
/// the maintenance task, then the HTTP server until SIGINT/SIGTERM.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to info, overridable with RUST_LOG
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "local_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting local cache service");

    let config = Config::from_env();
    info!(
        "Configuration loaded: prefix={}, version={}, default_expiry={}ms, quota={}B, storage={}, port={}, maintenance_interval={}s",
        config.key_prefix,
        config.version,
        config.default_expiry_ms,
        config.quota_bytes,
        config
            .storage_path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "memory".to_string()),
        config.server_port,
        config.maintenance_interval
    );

    let state = AppState::from_config(&config).context("failed to open cache storage")?;
    let report = state.cache.init();
    info!(
        "Cache initialized: swept={}, version_reset={}, cleared={}",
        report.swept, report.version_reset, report.cleared
    );

    let maintenance_handle = spawn_maintenance_task(
        state.cache.clone(),
        Duration::from_secs(config.maintenance_interval),
    );

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(maintenance_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM, then stops the maintenance task.
async fn shutdown_signal(maintenance_handle: JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    maintenance_handle.abort();
    warn!("Maintenance task aborted");
}
