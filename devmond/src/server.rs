use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::api;
use crate::config::{self, Config};
use crate::monitor::Monitor;
use crate::scheduler;

/// Runs the push server and the periodic scheduler until Ctrl-C.
pub async fn serve(cfg: Config) -> Result<()> {
    let monitor = Monitor::from_config(&cfg)?;
    let addr: SocketAddr = format!("{}:{}", cfg.server.bind, cfg.server.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", cfg.server.bind, cfg.server.port))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    let (stop, shutdown) = watch::channel(false);
    let ticker = tokio::spawn(scheduler::run_periodic(
        Arc::clone(&monitor),
        Duration::from_secs(cfg.sampling.interval_secs),
        shutdown,
    ));

    info!(
        "devmond is running. Open http://localhost:{} in your browser.",
        cfg.server.port
    );
    let result = axum::serve(listener, api::router(monitor))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error");

    let _ = stop.send(true);
    if let Err(err) = ticker.await {
        warn!("[scheduler] task ended abnormally: {err}");
    }
    result
}

/// True when the launch flag is set. Otherwise writes the one diagnostic
/// line and the caller should start nothing.
pub fn launch_allowed() -> bool {
    if config::launch_requested() {
        return true;
    }
    println!(
        "devmond cannot start because the {} environment variable is not set to true.",
        config::LAUNCH_ENV
    );
    false
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
