//! Service configuration loaded from the environment

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_EMBEDDING_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 512;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("OpenAI API key not configured. Set OPENAI_API_KEY and restart")]
  MissingApiKey,

  #[error("Invalid value for {key}: '{value}'")]
  InvalidValue { key: String, value: String },

  #[error("Could not determine a data directory. Set RETROLENS_DATA_DIR")]
  NoDataDir,
}

impl ConfigError {
  pub fn invalid_value(key: impl Into<String>, value: impl Into<String>) -> Self {
    Self::InvalidValue { key: key.into(), value: value.into() }
  }
}

/// Settings for the external embedding provider
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
  pub api_key: String,
  pub base_url: String,
  pub model: String,
  pub dimensions: usize,
  pub timeout_secs: u64,
}

impl EmbeddingConfig {
  pub fn new(api_key: impl Into<String>) -> Self {
    Self {
      api_key: api_key.into(),
      base_url: DEFAULT_EMBEDDING_URL.to_string(),
      model: DEFAULT_EMBEDDING_MODEL.to_string(),
      dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
      timeout_secs: DEFAULT_TIMEOUT_SECS,
    }
  }

  pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
    self.base_url = base_url.into();
    self
  }
}

/// Top-level configuration for the server and CLI
#[derive(Debug, Clone)]
pub struct Config {
  /// Missing key is only an error once embeddings are actually needed
  pub api_key: Option<String>,
  pub embedding_url: String,
  pub embedding_model: String,
  pub embedding_dimensions: usize,
  pub timeout_secs: u64,
  pub data_dir: PathBuf,
  pub bind: SocketAddr,
}

impl Config {
  /// Read configuration from environment variables, applying defaults
  pub fn from_env() -> Result<Self, ConfigError> {
    let api_key = std::env::var("OPENAI_API_KEY")
      .ok()
      .map(|key| key.trim().to_string())
      .filter(|key| !key.is_empty());

    Ok(Self {
      api_key,
      embedding_url: env_or("RETROLENS_EMBEDDING_URL", DEFAULT_EMBEDDING_URL),
      embedding_model: env_or("RETROLENS_EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL),
      embedding_dimensions: parse_env("RETROLENS_EMBEDDING_DIMENSIONS", DEFAULT_EMBEDDING_DIMENSIONS)?,
      timeout_secs: parse_env("RETROLENS_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
      data_dir: data_dir()?,
      bind: parse_env("RETROLENS_BIND", default_bind())?,
    })
  }

  /// Embedding settings; fails when no API key is configured
  pub fn embedding(&self) -> Result<EmbeddingConfig, ConfigError> {
    let api_key = self.api_key.clone().ok_or(ConfigError::MissingApiKey)?;
    Ok(EmbeddingConfig {
      api_key,
      base_url: self.embedding_url.clone(),
      model: self.embedding_model.clone(),
      dimensions: self.embedding_dimensions,
      timeout_secs: self.timeout_secs,
    })
  }

  pub fn store_path(&self) -> PathBuf {
    self.data_dir.join("retrolens.json")
  }
}

fn env_or(key: &str, default: &str) -> String {
  std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
  match std::env::var(key) {
    Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::invalid_value(key, raw)),
    Err(_) => Ok(default),
  }
}

fn default_bind() -> SocketAddr {
  SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn data_dir() -> Result<PathBuf, ConfigError> {
  if let Ok(custom) = std::env::var("RETROLENS_DATA_DIR") {
    return Ok(PathBuf::from(custom));
  }

  let home = dirs::home_dir().ok_or(ConfigError::NoDataDir)?;
  Ok(home.join(".retrolens"))
}
