//! # ferryd
//!
//! Ferry server binary — wires the registries, storage, and HTTP/WebSocket
//! server together and runs until interrupted.

#![deny(unsafe_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use ferry_core::SystemClock;
use ferry_server::FerryServer;
use ferry_server::qr;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Ferry LAN file-sharing server.
#[derive(Parser, Debug)]
#[command(name = "ferryd", about = "LAN file sharing with live device presence")]
struct Cli {
    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides settings).
    #[arg(long)]
    port: Option<u16>,

    /// Root directory for stored files (overrides settings).
    #[arg(long)]
    data_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("FERRY_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut settings = ferry_settings::load_settings().context("failed to load settings")?;
    if let Some(host) = cli.host {
        settings.server.host = host;
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }
    if let Some(data_dir) = cli.data_dir {
        settings.files.data_dir = Some(data_dir);
    }

    let host = settings.server.host.clone();
    let port = settings.server.port;

    let server = FerryServer::new(settings, Arc::new(SystemClock));
    server
        .state()
        .store
        .ensure_dirs()
        .await
        .context("failed to create storage directories")?;
    server.spawn_sweep();

    let app = server
        .router()
        .into_make_service_with_connect_info::<SocketAddr>();

    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("failed to bind {host}:{port}"))?;
    let bound = listener.local_addr()?;

    let local_ip = qr::local_ip();
    let state = server.state();
    info!(%bound, "ferry server starting");
    info!(url = %qr::server_url(&local_ip, bound.port()), "phones connect here (QR at /api/qr)");
    info!(inbound = %state.store.dir(ferry_server::storage::Folder::Inbound).display(),
        outbound = %state.store.dir(ferry_server::storage::Folder::Outbound).display(),
        "storage folders");
    let max = state.settings.files.max_upload_bytes;
    if max == 0 {
        info!("max upload size: unlimited");
    } else {
        info!(max_upload_bytes = max, "max upload size");
    }

    let shutdown = server.shutdown().clone();
    let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("interrupt received, shutting down");
    });

    serve.await.context("server error")?;
    shutdown.graceful_shutdown(None).await;
    info!("goodbye");
    Ok(())
}
