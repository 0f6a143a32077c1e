//! Command-line front end over the file-backed store

pub mod commands;
pub mod display;

use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Install the tracing subscriber shared by both binaries
pub fn init_tracing(verbose: bool) {
  let filter = if verbose {
    EnvFilter::new("retrolens=debug,tower_http=debug,info")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("retrolens=info,warn"))
  };

  tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();
}
