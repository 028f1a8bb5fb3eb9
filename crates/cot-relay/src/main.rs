use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use cot_relay::{
    config::{RelayConfig, DEFAULT_CONFIG_PATH},
    server::{router, AppState},
    transport::UdpTransmitter,
};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Relay HTTP position reports to a CoT consumer over UDP.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// JSON config file with atak_host, atak_port and api_keys
    #[arg(short, long, env = "COT_RELAY_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// HTTP listen address, overrides listen_addr from the config file
    #[arg(short, long)]
    listen: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let config = RelayConfig::load(&args.config)?;
    let listen = args.listen.unwrap_or(config.listen_addr);

    let transmitter = UdpTransmitter::new(&config.atak_host, config.atak_port)
        .with_context(|| format!("udp destination {}:{}", config.atak_host, config.atak_port))?;
    info!("relaying to {} with {} api keys", transmitter.dest(), config.api_keys.len());

    let app = router(AppState::new(Arc::new(transmitter), config));
    let listener = TcpListener::bind(listen).await.with_context(|| format!("bind {listen}"))?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            signal::ctrl_c().await.ok();
            info!("shutting down");
        })
        .await?;
    Ok(())
}
