//! Embedding provider boundary
//!
//! The theme pipeline only needs `embed(texts) -> vectors` with matching
//! length and order. [`OpenAiEmbeddingProvider`] talks to an
//! OpenAI-compatible `/embeddings` endpoint; tests inject their own
//! [`EmbeddingProvider`] implementations.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::EmbeddingConfig;

#[derive(Error, Debug)]
pub enum EmbeddingError {
  #[error("OpenAI client is not initialized: {message}")]
  ClientInit { message: String },

  #[error("OpenAI API error: {message}")]
  Request { message: String },

  #[error("OpenAI API error ({status}): {body}")]
  Rejected { status: u16, body: String },

  #[error("OpenAI API error: invalid response: {message}")]
  InvalidResponse { message: String },

  #[error("Embedding count mismatch: sent {expected} texts, received {received} vectors")]
  CountMismatch { expected: usize, received: usize },
}

impl EmbeddingError {
  pub fn request(message: impl Into<String>) -> Self {
    Self::Request { message: message.into() }
  }

  pub fn invalid_response(message: impl Into<String>) -> Self {
    Self::InvalidResponse { message: message.into() }
  }
}

/// Turns a batch of texts into fixed-length vectors, same order as the input
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
  async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
  model: &'a str,
  input: &'a [String],
  dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
  data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
  index: usize,
  embedding: Vec<f32>,
}

/// Client for an OpenAI-compatible embeddings API
pub struct OpenAiEmbeddingProvider {
  client: Client,
  config: EmbeddingConfig,
}

impl OpenAiEmbeddingProvider {
  pub fn new(config: EmbeddingConfig) -> Result<Self, EmbeddingError> {
    if config.api_key.trim().is_empty() {
      return Err(EmbeddingError::ClientInit { message: "API key is empty".to_string() });
    }

    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| EmbeddingError::ClientInit { message: e.to_string() })?;

    Ok(Self { client, config })
  }

  pub fn model(&self) -> &str {
    &self.config.model
  }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
  async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    if texts.is_empty() {
      return Ok(Vec::new());
    }

    debug!(count = texts.len(), model = %self.config.model, "requesting embeddings");

    let url = format!("{}/embeddings", self.config.base_url.trim_end_matches('/'));
    let request =
      EmbeddingRequest { model: &self.config.model, input: texts, dimensions: self.config.dimensions };

    let response = self
      .client
      .post(&url)
      .bearer_auth(&self.config.api_key)
      .json(&request)
      .send()
      .await
      .map_err(|e| EmbeddingError::request(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      error!(status = status.as_u16(), "embedding request rejected");
      return Err(EmbeddingError::Rejected { status: status.as_u16(), body });
    }

    let parsed: EmbeddingResponse =
      response.json().await.map_err(|e| EmbeddingError::invalid_response(e.to_string()))?;

    order_embeddings(parsed.data, texts.len())
  }
}

// The API tags each vector with its input index; restore input order and
// reject anything that does not line up one-to-one.
fn order_embeddings(mut data: Vec<EmbeddingData>, expected: usize) -> Result<Vec<Vec<f32>>, EmbeddingError> {
  if data.len() != expected {
    return Err(EmbeddingError::CountMismatch { expected, received: data.len() });
  }

  data.sort_by_key(|item| item.index);
  if data.iter().enumerate().any(|(position, item)| item.index != position) {
    return Err(EmbeddingError::invalid_response("embedding indices do not cover the input"));
  }

  let dimension = data.first().map_or(0, |item| item.embedding.len());
  if data.iter().any(|item| item.embedding.len() != dimension) {
    return Err(EmbeddingError::invalid_response("embeddings have differing dimensions"));
  }

  Ok(data.into_iter().map(|item| item.embedding).collect())
}

#[cfg(test)]
mod tests {
  use super::*;
  use mockito::{Matcher, Server};

  fn provider_for(server: &Server) -> OpenAiEmbeddingProvider {
    let config = EmbeddingConfig::new("sk-test").with_base_url(server.url());
    OpenAiEmbeddingProvider::new(config).unwrap()
  }

  fn texts(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
  }

  #[test]
  fn test_empty_api_key_fails_construction() {
    let result = OpenAiEmbeddingProvider::new(EmbeddingConfig::new(""));
    assert!(matches!(result, Err(EmbeddingError::ClientInit { .. })));
  }

  #[tokio::test]
  async fn test_embed_restores_input_order() {
    let mut server = Server::new_async().await;
    let body = r#"{
      "object": "list",
      "data": [
        {"object": "embedding", "index": 1, "embedding": [0.0, 1.0]},
        {"object": "embedding", "index": 0, "embedding": [1.0, 0.0]}
      ],
      "model": "text-embedding-3-small"
    }"#;

    let mock = server
      .mock("POST", "/embeddings")
      .match_header("authorization", "Bearer sk-test")
      .match_body(Matcher::PartialJson(serde_json::json!({
        "model": "text-embedding-3-small",
        "input": ["first", "second"],
        "dimensions": 512
      })))
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(body)
      .create_async()
      .await;

    let provider = provider_for(&server);
    let embeddings = provider.embed(&texts(&["first", "second"])).await.unwrap();

    mock.assert_async().await;
    assert_eq!(embeddings, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
  }

  #[tokio::test]
  async fn test_rejected_request_surfaces_status_and_body() {
    let mut server = Server::new_async().await;
    let _mock = server
      .mock("POST", "/embeddings")
      .with_status(401)
      .with_body("Incorrect API key provided")
      .create_async()
      .await;

    let provider = provider_for(&server);
    let error = provider.embed(&texts(&["hello"])).await.unwrap_err();

    match error {
      EmbeddingError::Rejected { status, body } => {
        assert_eq!(status, 401);
        assert!(body.contains("Incorrect API key"));
      }
      other => panic!("Expected Rejected error, got: {other:?}"),
    }
  }

  #[tokio::test]
  async fn test_short_response_is_a_count_mismatch() {
    let mut server = Server::new_async().await;
    let _mock = server
      .mock("POST", "/embeddings")
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(r#"{"data": [{"index": 0, "embedding": [0.5]}]}"#)
      .create_async()
      .await;

    let provider = provider_for(&server);
    let error = provider.embed(&texts(&["one", "two"])).await.unwrap_err();

    assert!(matches!(error, EmbeddingError::CountMismatch { expected: 2, received: 1 }));
  }

  #[tokio::test]
  async fn test_malformed_json_is_invalid_response() {
    let mut server = Server::new_async().await;
    let _mock = server
      .mock("POST", "/embeddings")
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body("not json")
      .create_async()
      .await;

    let provider = provider_for(&server);
    let error = provider.embed(&texts(&["one"])).await.unwrap_err();

    assert!(matches!(error, EmbeddingError::InvalidResponse { .. }));
  }

  #[tokio::test]
  async fn test_empty_input_skips_the_request() {
    let server = Server::new_async().await;
    let provider = provider_for(&server);

    let embeddings = provider.embed(&[]).await.unwrap();
    assert!(embeddings.is_empty());
  }

  #[test]
  fn test_order_embeddings_rejects_duplicate_indices() {
    let data = vec![
      EmbeddingData { index: 0, embedding: vec![1.0] },
      EmbeddingData { index: 0, embedding: vec![2.0] },
    ];

    assert!(matches!(order_embeddings(data, 2), Err(EmbeddingError::InvalidResponse { .. })));
  }
}
