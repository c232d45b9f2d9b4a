//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems from validated settings
//! - Warm the config cache and start the content watcher
//! - Bind listeners and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: bind and watcher errors are fatal
//! - Preload failures are logged, not fatal; those tenants load lazily later
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::admin::setup_admin_router;
use crate::config::watcher::invalidate_on_change;
use crate::config::{ContentWatcher, ServiceConfig};
use crate::content::loader::ConfigLoader;
use crate::http::{AppState, HttpServer};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::shutdown_on_signal;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to watch content directory: {0}")]
    Watch(#[from] notify::Error),

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

async fn bind(address: &str) -> Result<TcpListener, StartupError> {
    TcpListener::bind(address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.to_string(),
            source,
        })
}

/// Run the service until a termination signal arrives.
pub async fn run(config: ServiceConfig) -> Result<(), StartupError> {
    let shutdown = Shutdown::new();

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let loader = Arc::new(ConfigLoader::new());
    let content = &config.content;

    if !content.preload.is_empty() {
        let report = loader.preload(&content.preload, &content.base_path).await;
        tracing::info!(
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            "Preloaded tenant configurations"
        );
    }

    // Dropping the watcher stops it, so it lives until run returns.
    let _watcher = if content.watch {
        let (watcher, changes) = ContentWatcher::new(&content.base_path);
        let handle = watcher.run()?;
        tokio::spawn(invalidate_on_change(
            Arc::clone(&loader),
            changes,
            shutdown.clone(),
        ));
        Some(handle)
    } else {
        None
    };

    let state = AppState::new(&config, Arc::clone(&loader));

    if config.admin.enabled {
        let listener = bind(&config.admin.bind_address).await?;
        tracing::info!(address = %config.admin.bind_address, "Admin API listening");
        let router = setup_admin_router(state.clone());
        let stop = shutdown.wait();
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(stop)
                .await
            {
                tracing::error!(error = %e, "Admin server failed");
            }
        });
    }

    let listener = bind(&config.listener.bind_address).await?;
    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    let grace = Duration::from_secs(config.timeouts.shutdown_secs);
    let deadline = shutdown.wait();
    let server = HttpServer::new(&config, state).run(listener, shutdown);
    tokio::select! {
        result = server => result?,
        _ = async {
            deadline.await;
            tokio::time::sleep(grace).await;
        } => {
            tracing::warn!(grace_secs = grace.as_secs(), "Shutdown grace period elapsed, dropping in-flight requests");
        }
    }
    Ok(())
}
