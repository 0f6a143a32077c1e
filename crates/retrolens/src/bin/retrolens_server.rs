//! Retrolens REST Server
//!
//! HTTP REST API server for retrospectives, feedback, and theme identification.

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use tracing::info;

use retrolens::cli::init_tracing;
use retrolens::config::{Config, DEFAULT_BIND};
use retrolens::server::{startup::start_server, AppState};

#[derive(Parser)]
#[command(name = "retrolens_server")]
#[command(about = "Retrolens REST API Server")]
#[command(version)]
struct Args {
  /// Server bind address
  #[arg(long, env = "RETROLENS_BIND", default_value = DEFAULT_BIND)]
  bind: SocketAddr,

  /// Enable verbose logging
  #[arg(short, long)]
  verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  init_tracing(args.verbose);

  let config = Config::from_env()?;
  info!("Starting Retrolens REST Server v{}", env!("CARGO_PKG_VERSION"));
  info!("Store: {}", config.store_path().display());

  let state = AppState::from_config(&config)?;
  start_server(args.bind, state).await?;

  Ok(())
}
