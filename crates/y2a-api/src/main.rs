//! Axum API server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use y2a_api::{create_private_router, create_public_router, ApiConfig, AppState};
use y2a_client::{ConverterClient, VideoInfoClient};
use y2a_fleet::{DirectoryConfig, DirectoryReader, NodeSelector};
use y2a_store::{Store, StoreConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    // Install rustls crypto provider (required for rustls 0.23+)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("rustls crypto provider was already installed");
    }

    info!("Starting y2a-api");

    let config = ApiConfig::from_env();
    info!(
        "API config: host={}, port={}, private_port={}",
        config.host, config.port, config.private_port
    );

    let store = Store::open(&StoreConfig::from_env()).context("Failed to open store")?;

    let directory = DirectoryReader::start(DirectoryConfig::from_env())
        .await
        .context("Failed to load the fleet from Consul")?;
    let selector = NodeSelector::new(directory.view());

    let converter = ConverterClient::from_env().context("Failed to build converter client")?;
    let metadata = VideoInfoClient::from_env().context("Failed to build metadata client")?;

    let state = AppState::new(
        config.clone(),
        store,
        selector,
        converter,
        Arc::new(metadata),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let public = serve(
        "public",
        bind_addr(&config.host, config.port)?,
        create_public_router(state.clone()),
        shutdown_rx.clone(),
    );
    let private = serve(
        "private",
        bind_addr(&config.host, config.private_port)?,
        create_private_router(state),
        shutdown_rx,
    );

    tokio::try_join!(public, private)?;

    directory.shutdown().await;
    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

fn bind_addr(host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", host, port))
}

async fn serve(
    name: &'static str,
    addr: SocketAddr,
    app: Router,
    mut shutdown_rx: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {} listener on {}", name, addr))?;

    info!("Listening ({}) on {}", name, addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.wait_for(|stop| *stop).await;
        })
        .await
        .with_context(|| format!("{} server failed", name))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for CTRL+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
