//! reqres: login form demo server.
//!
//! Serves the form on `GET /`, echoes `POST /login` bodies as JSON and
//! answers everything else with 404. Listens on port 5000 until ctrl-c.

use reqres_core::{Server, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqres=debug,reqres_core=debug")),
        )
        .init();

    let config = ServerConfig::default();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()?;

    runtime.block_on(run(config))
}

async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let drain_timeout = config.drain_timeout;

    let server = Server::bind(config).await?;
    let handle = server.start()?;
    info!("Server running on http://localhost:{}", handle.local_addr().port());

    tokio::signal::ctrl_c().await?;
    info!("ctrl-c received");

    if !handle.graceful_shutdown(drain_timeout).await {
        info!(
            active = handle.active_connections(),
            "exiting with connections still open"
        );
    }

    Ok(())
}
