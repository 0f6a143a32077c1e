//! REST API for retrospectives, feedback, and theme identification
//!
//! Uses axum for routing and schemars for OpenAPI documentation generation.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::embedding::OpenAiEmbeddingProvider;
use crate::store::{FileStore, RetroStore};
use crate::themes::ThemeService;

pub mod handlers;
pub mod middleware;
pub mod routing;
pub mod startup;
pub mod types;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn RetroStore>,
  /// Absent when no embedding provider is configured
  pub themes: Option<Arc<ThemeService>>,
}

impl AppState {
  pub fn new(store: Arc<dyn RetroStore>, themes: Option<Arc<ThemeService>>) -> Self {
    Self { store, themes }
  }

  /// File-backed state; theme identification is disabled without an API key
  pub fn from_config(config: &Config) -> Result<Self> {
    let store = Arc::new(FileStore::new(config.store_path()));

    let themes = match config.embedding() {
      Ok(embedding) => {
        let provider = Arc::new(OpenAiEmbeddingProvider::new(embedding)?);
        info!(model = provider.model(), "embedding provider ready");
        Some(Arc::new(ThemeService::new(provider, store.clone(), store.clone())))
      }
      Err(e) => {
        warn!("{e}");
        None
      }
    };

    Ok(Self::new(store, themes))
  }
}
