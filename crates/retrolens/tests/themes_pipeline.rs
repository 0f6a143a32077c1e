use async_trait::async_trait;
use mockall::mock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use retrolens::clustering::{CentroidClustering, ClusterError};
use retrolens::embedding::{EmbeddingError, EmbeddingProvider};
use retrolens::feedback::{FeedbackItem, FeedbackType, Retrospective};
use retrolens::store::{FeedbackSource, FileStore, RetroStore, ThemeStore};
use retrolens::themes::{ThemeRequest, ThemeService};

mock! {
  pub Embeddings {}

  #[async_trait]
  impl EmbeddingProvider for Embeddings {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
  }
}

/// Engine that always faults, forcing the round-robin fallback
struct BrokenEngine;

impl CentroidClustering for BrokenEngine {
  fn fit(&self, vectors: &[Vec<f32>], _k: usize) -> Result<Vec<usize>, ClusterError> {
    Err(ClusterError::NonFiniteComponent { index: vectors.len() - 1 })
  }
}

async fn seeded(messages: &[&str]) -> (TempDir, Arc<FileStore>, String) {
  let temp = TempDir::new().unwrap();
  let store = Arc::new(FileStore::new(temp.path().join("retrolens.json")));
  let retro = store.create_retro(Retrospective::new("Sprint 3".into(), Some(3), "Growth".into())).await.unwrap();
  for message in messages {
    store.add_feedback(FeedbackItem::new(&retro.id, FeedbackType::Didnt, message)).await.unwrap();
  }
  (temp, store, retro.id)
}

fn line_embeddings(texts: &[String]) -> Vec<Vec<f32>> {
  texts.iter().enumerate().map(|(i, _)| vec![i as f32 * 10.0, 0.0]).collect()
}

#[tokio::test]
async fn test_single_batched_embedding_call_per_run() {
  let (_temp, store, retro_id) = seeded(&["one", "two", "three", "four", "five", "six"]).await;

  let mut embeddings = MockEmbeddings::new();
  embeddings.expect_embed().withf(|texts| texts.len() == 6).times(1).returning(|texts| Ok(line_embeddings(texts)));

  let service = ThemeService::new(Arc::new(embeddings), store.clone(), store.clone());
  let report = service.identify_themes(&ThemeRequest::new(&retro_id).with_num_clusters(3)).await.unwrap();

  assert_eq!(report.themes.len(), 3);
  let total: usize = report.themes.iter().map(|t| t.feedback_count).sum();
  assert_eq!(total, 6);
  assert_eq!(store.themes_for(&retro_id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_rerun_overwrites_saved_themes() {
  let (_temp, store, retro_id) = seeded(&["one", "two", "three", "four"]).await;

  let mut embeddings = MockEmbeddings::new();
  embeddings.expect_embed().times(2).returning(|texts| Ok(line_embeddings(texts)));

  let service = ThemeService::new(Arc::new(embeddings), store.clone(), store.clone());
  let request = ThemeRequest::new(&retro_id).with_num_clusters(2);
  service.identify_themes(&request).await.unwrap();
  service.identify_themes(&request).await.unwrap();

  assert_eq!(store.themes_for(&retro_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_clustering_fault_falls_back_to_round_robin() {
  let (_temp, store, retro_id) = seeded(&["aa", "bb", "cc", "dd", "ee", "ff"]).await;

  let mut embeddings = MockEmbeddings::new();
  embeddings.expect_embed().returning(|texts| Ok(line_embeddings(texts)));

  let service =
    ThemeService::new(Arc::new(embeddings), store.clone(), store.clone()).with_engine(Box::new(BrokenEngine));
  let report = service.identify_themes(&ThemeRequest::new(&retro_id).with_num_clusters(3)).await.unwrap();

  let items = store.feedback_for(&retro_id, None).await.unwrap();
  let names: Vec<&str> = report.themes.iter().map(|t| t.name.as_str()).collect();
  assert_eq!(names, vec!["aa", "bb", "cc"]);
  assert_eq!(report.themes[0].feedback_ids, vec![items[0].id.clone(), items[3].id.clone()]);
}

/// Tracks the peak number of `embed` calls running at once
#[derive(Default)]
struct InFlightEmbeddings {
  current: AtomicUsize,
  peak: AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for InFlightEmbeddings {
  async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
    self.peak.fetch_max(now, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(50)).await;
    self.current.fetch_sub(1, Ordering::SeqCst);
    Ok(line_embeddings(texts))
  }
}

#[tokio::test]
async fn test_concurrent_runs_for_one_retro_are_serialized() {
  let (_temp, store, retro_id) = seeded(&["one", "two", "three", "four"]).await;
  let embeddings = Arc::new(InFlightEmbeddings::default());

  let service = ThemeService::new(embeddings.clone(), store.clone(), store.clone());
  let request = ThemeRequest::new(&retro_id);

  let (first, second) = tokio::join!(service.identify_themes(&request), service.identify_themes(&request));

  assert_eq!(first.unwrap(), second.unwrap());
  assert_eq!(embeddings.peak.load(Ordering::SeqCst), 1);
  assert_eq!(store.themes_for(&retro_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_runs_for_different_retros_overlap() {
  let (_temp, store, first_id) = seeded(&["one", "two", "three", "four"]).await;
  let other = store.create_retro(Retrospective::new("Sprint 4".into(), Some(4), "Growth".into())).await.unwrap();
  for message in ["five", "six"] {
    store.add_feedback(FeedbackItem::new(&other.id, FeedbackType::Well, message)).await.unwrap();
  }
  let embeddings = Arc::new(InFlightEmbeddings::default());

  let service = ThemeService::new(embeddings.clone(), store.clone(), store.clone());
  let (first_request, second_request) = (ThemeRequest::new(&first_id), ThemeRequest::new(&other.id));

  let (first, second) =
    tokio::join!(service.identify_themes(&first_request), service.identify_themes(&second_request));

  first.unwrap();
  second.unwrap();
  assert_eq!(embeddings.peak.load(Ordering::SeqCst), 2);
}
