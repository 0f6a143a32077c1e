//! REST server startup and configuration

use anyhow::Result;
use axum::serve;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::server::routing::create_router;
use crate::server::AppState;

/// Start the REST server
pub async fn start_server(addr: SocketAddr, state: AppState) -> Result<()> {
  info!("Starting retrolens REST server on {addr}");
  if state.themes.is_none() {
    info!("No embedding provider configured; POST /themes will report the missing API key");
  }

  let app = create_router(state).layer(
    ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()), // TODO: restrict CORS origins once a web client is deployed
  );

  let listener = TcpListener::bind(addr).await?;
  info!("Server listening on {addr}");

  match serve(listener, app).await {
    Ok(_) => {
      info!("Server shutdown gracefully");
      Ok(())
    }
    Err(e) => {
      error!("Server error: {e}");
      Err(anyhow::anyhow!("Server error: {}", e))
    }
  }
}
