//! sw_cache - A service-worker style caching proxy
//!
//! Serves a site through cache-first, network-first and
//! stale-while-revalidate caching in front of an upstream origin.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sw_cache::api::{create_router, AppState};
use sw_cache::{spawn_cleanup_task, Config};

/// Main entry point for the caching proxy.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the worker over an upstream fetcher
/// 4. Install (pre-cache) and activate the worker
/// 5. Start the periodic cache cleanup trigger, if enabled
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sw_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting sw_cache caching proxy");

    let config = Config::from_env();
    info!(
        "Configuration loaded: upstream={}, site_origin={}, caches={}/{}, port={}, retention={}d, clean_interval={}s",
        config.upstream_url,
        config.site_origin,
        config.static_cache_name(),
        config.dynamic_cache_name(),
        config.server_port,
        config.retention_days,
        config.clean_interval
    );

    let state = AppState::from_config(&config);

    // Install failures are logged by the worker; activation proceeds regardless
    if let Err(e) = state.worker.install().await {
        warn!("Continuing without pre-cached assets: {}", e);
    }
    state.worker.activate().await;

    let cleanup_handle = if config.clean_interval > 0 {
        Some(spawn_cleanup_task(state.worker.clone(), config.clean_interval))
    } else {
        info!("Periodic cache cleanup disabled");
        None
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the cleanup task and allows graceful shutdown.
async fn shutdown_signal(cleanup_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
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

    if let Some(handle) = cleanup_handle {
        handle.abort();
        warn!("Cleanup task aborted");
    }
}
