//! deployd: deployment plan daemon
//!
//! Stores deployment plans per owner and tells devices which packages, and
//! which versions, they may run.
//!
//! Usage:
//!   deployd --port 8080 --database deployd.db \
//!     --filter-service-url http://filters:8080 \
//!     --component-service-url http://components:8080

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use deployd_client::ClientConfig;
use deployd_server::{build_router, ServerConfig};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "deployd")]
#[command(about = "Deployment plan resolution service")]
struct Args {
    /// HTTP port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Path to the SQLite plan database
    #[arg(short, long, default_value = "deployd.db")]
    database: PathBuf,

    /// Base URL of the filter service
    #[arg(long, default_value = "http://localhost:8080")]
    filter_service_url: String,

    /// Base URL of the component service
    #[arg(long, default_value = "http://localhost:8080")]
    component_service_url: String,

    /// Timeout for collaborator requests, in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            port: self.port,
            database: self.database.clone(),
            filter_service: ClientConfig {
                base_url: self.filter_service_url.clone(),
                timeout_secs: self.timeout_secs,
            },
            component_service: ClientConfig {
                base_url: self.component_service_url.clone(),
                timeout_secs: self.timeout_secs,
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    let config = args.server_config();
    info!(database = %config.database.display(), "deployd starting");

    let manager = config
        .build_manager()
        .context("failed to initialise deployment manager")?;
    let app = build_router(Arc::new(manager));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind HTTP port {}", config.port))?;
    info!(
        port = config.port,
        filters = %config.filter_service.base_url,
        components = %config.component_service.base_url,
        "HTTP API listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("deployd stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(e) => {
            warn!("cannot listen for ctrl-c, running until killed: {e}");
            std::future::pending::<()>().await;
        }
    }
}
