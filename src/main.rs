//! Tenant content service.
//!
//! Serves validated per-tenant site configuration over HTTP.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ tenant::resolver ──▶ tenant::context
//!                                                                  │
//!                                                                  ▼
//!                     {base}/{slug}/config.json ◀── content::loader ──▶ content::cache
//!                                 │
//!                                 ▼
//!                     content::validator (content::schema)
//!
//!     Cross-cutting: config (settings + watcher), observability,
//!                    lifecycle (startup/shutdown), admin API
//! ```

use std::path::PathBuf;

use clap::Parser;

use tenant_content::config::load_config_or_default;
use tenant_content::lifecycle;
use tenant_content::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "tenant-content", version, about = "Multi-tenant content service")]
struct Args {
    /// Settings file (TOML).
    #[arg(short, long, env = "TENANT_CONTENT_CONFIG", default_value = "tenant-content.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config_or_default(&args.config)?;

    init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "tenant-content starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        base_path = %config.content.base_path.display(),
        strategy = %config.resolver.strategy,
        use_cache = config.content.use_cache,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    lifecycle::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
