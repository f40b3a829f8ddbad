//! chain-rest server binary
//!
//! Serves the REST interface over a node seeded with the network's
//! genesis block.

use anyhow::{Context, Result};
use chain_rest::config::{ChainNetwork, GatewayConfig, LoggingConfig};
use chain_rest::utils::logging::init_logging_from_config;
use chain_rest::{Node, RestServer};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(clap::Parser, Debug)]
#[command(name = "chain-rest")]
#[command(about = "Read-only REST gateway for a Bitcoin node")]
struct Args {
    /// Configuration file (TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on (overrides the config file)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Network (overrides the config file)
    #[arg(short, long, value_enum)]
    network: Option<ChainNetwork>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GatewayConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?,
        None => GatewayConfig::default(),
    };
    if let Some(listen) = args.listen {
        config.rest.listen_addr = listen;
    }
    if let Some(network) = args.network {
        config.network = network;
    }
    if args.verbose {
        let logging = config.logging.get_or_insert_with(LoggingConfig::default);
        logging.filter = Some("debug".to_string());
    }

    init_logging_from_config(config.logging.as_ref());
    config.validate()?;
    for warning in config.validate_security() {
        warn!("{}", warning);
    }

    let node = Node::with_genesis(config.network.into())?.with_mempool_config(config.mempool.clone());
    node.set_warmup_finished();
    info!("Serving {:?} chain", config.network);

    let server = RestServer::from_config(&config.rest, Arc::new(node));
    server.start().await
}
