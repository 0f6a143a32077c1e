//! Theme identification pipeline
//!
//! A run for one retrospective: fetch feedback, embed every message in a
//! single batch, cluster the vectors, label each cluster with its shortest
//! member, then upsert the resulting themes. Embedding failures end the run
//! before anything is written. Persistence failures are logged and the
//! computed themes are still returned.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clustering::{self, CentroidClustering, KMeans, DEFAULT_CLUSTER_COUNT};
use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::feedback::{FeedbackItem, FeedbackType};
use crate::labeler;
use crate::store::{FeedbackSource, StoreError, ThemeStore};

/// Theme type recorded when no feedback filter was applied
pub const ALL_FEEDBACK_TYPES: &str = "all";

/// A named group of feedback items, unique per (retro_id, name)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Theme {
  pub name: String,
  pub retro_id: String,
  pub feedback_ids: Vec<String>,
  #[serde(rename = "type")]
  pub theme_type: String,
  /// Embedding of the theme's first member
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub embedding: Option<Vec<f32>>,
}

/// Theme as reported to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ThemeSummary {
  pub name: String,
  #[serde(rename = "type")]
  pub theme_type: String,
  pub feedback_count: usize,
  pub feedback_ids: Vec<String>,
}

impl From<&Theme> for ThemeSummary {
  fn from(theme: &Theme) -> Self {
    Self {
      name: theme.name.clone(),
      theme_type: theme.theme_type.clone(),
      feedback_count: theme.feedback_ids.len(),
      feedback_ids: theme.feedback_ids.clone(),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThemeRequest {
  #[serde(default)]
  pub retro_id: String,
  #[serde(default)]
  pub feedback_type: Option<FeedbackType>,
  #[serde(default)]
  pub num_clusters: Option<usize>,
}

impl ThemeRequest {
  pub fn new(retro_id: impl Into<String>) -> Self {
    Self { retro_id: retro_id.into(), ..Default::default() }
  }

  pub fn with_feedback_type(mut self, feedback_type: FeedbackType) -> Self {
    self.feedback_type = Some(feedback_type);
    self
  }

  pub fn with_num_clusters(mut self, num_clusters: usize) -> Self {
    self.num_clusters = Some(num_clusters);
    self
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ThemeReport {
  pub message: String,
  pub themes: Vec<ThemeSummary>,
}

#[derive(Error, Debug)]
pub enum ThemesError {
  #[error("Retro ID is required")]
  MissingRetroId,

  #[error("No feedback items found to cluster")]
  NoFeedback,

  #[error("Failed to fetch feedback: {0}")]
  FeedbackSource(#[source] StoreError),

  #[error("Failed to generate embeddings: {0}")]
  Embedding(#[from] EmbeddingError),
}

/// Runs the theme pipeline against injected collaborators
pub struct ThemeService {
  embeddings: Arc<dyn EmbeddingProvider>,
  feedback: Arc<dyn FeedbackSource>,
  themes: Arc<dyn ThemeStore>,
  engine: Box<dyn CentroidClustering>,
  // one lock per retrospective so re-clustering runs never interleave
  runs: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ThemeService {
  pub fn new(
    embeddings: Arc<dyn EmbeddingProvider>,
    feedback: Arc<dyn FeedbackSource>,
    themes: Arc<dyn ThemeStore>,
  ) -> Self {
    Self { embeddings, feedback, themes, engine: Box::new(KMeans::default()), runs: Mutex::new(HashMap::new()) }
  }

  /// Replace the clustering routine
  pub fn with_engine(mut self, engine: Box<dyn CentroidClustering>) -> Self {
    self.engine = engine;
    self
  }

  pub async fn identify_themes(&self, request: &ThemeRequest) -> Result<ThemeReport, ThemesError> {
    let retro_id = request.retro_id.trim();
    if retro_id.is_empty() {
      return Err(ThemesError::MissingRetroId);
    }

    let run_lock = self.run_lock(retro_id).await;
    let result = {
      let _guard = run_lock.lock().await;
      self.run(retro_id, request).await
    };
    self.release_run_lock(retro_id, run_lock).await;
    result
  }

  async fn run(&self, retro_id: &str, request: &ThemeRequest) -> Result<ThemeReport, ThemesError> {
    let items = self
      .feedback
      .feedback_for(retro_id, request.feedback_type)
      .await
      .map_err(ThemesError::FeedbackSource)?;
    if items.is_empty() {
      return Err(ThemesError::NoFeedback);
    }

    let texts: Vec<String> = items.iter().map(|item| item.message.clone()).collect();
    let embeddings = self.embeddings.embed(&texts).await?;
    if embeddings.len() != items.len() {
      return Err(EmbeddingError::CountMismatch { expected: items.len(), received: embeddings.len() }.into());
    }

    let requested = request.num_clusters.unwrap_or(DEFAULT_CLUSTER_COUNT).max(1);
    // fewer items than requested clusters keeps every item on its own
    let k = if items.len() < requested {
      requested
    } else {
      clustering::optimal_cluster_count(items.len(), requested)
    };
    debug!(retro_id, items = items.len(), requested, k, "clustering feedback");

    let assignment = clustering::cluster_with(self.engine.as_ref(), &embeddings, k);
    let theme_type = request.feedback_type.map_or(ALL_FEEDBACK_TYPES, |t| t.as_str());
    let themes = build_themes(retro_id, theme_type, &assignment, &items, &embeddings);

    if let Err(e) = self.themes.upsert_themes(&themes).await {
      warn!(retro_id, error = %e, "failed to save themes; returning them unsaved");
    }

    info!(retro_id, themes = themes.len(), items = items.len(), "identified themes");
    Ok(ThemeReport {
      message: format!("Successfully identified {} themes from {} feedback items", themes.len(), items.len()),
      themes: themes.iter().map(ThemeSummary::from).collect(),
    })
  }

  async fn run_lock(&self, retro_id: &str) -> Arc<Mutex<()>> {
    let mut runs = self.runs.lock().await;
    runs.entry(retro_id.to_string()).or_default().clone()
  }

  // drops the map entry once no other run holds or waits on it
  async fn release_run_lock(&self, retro_id: &str, run_lock: Arc<Mutex<()>>) {
    let mut runs = self.runs.lock().await;
    drop(run_lock);
    if runs.get(retro_id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
      runs.remove(retro_id);
    }
  }
}

/// Group items by cluster id, in order of each cluster's first member
pub fn build_themes(
  retro_id: &str,
  theme_type: &str,
  assignment: &[usize],
  items: &[FeedbackItem],
  embeddings: &[Vec<f32>],
) -> Vec<Theme> {
  let labels = labeler::label_clusters(assignment, items);
  let mut order: Vec<usize> = Vec::new();
  let mut members: HashMap<usize, Vec<usize>> = HashMap::new();

  for (index, cluster) in assignment.iter().enumerate().take(items.len()) {
    if !members.contains_key(cluster) {
      order.push(*cluster);
    }
    members.entry(*cluster).or_default().push(index);
  }

  let mut taken: HashSet<String> = HashSet::new();
  order
    .into_iter()
    .map(|cluster| {
      let indices = &members[&cluster];
      let label = labels.get(&cluster).cloned().unwrap_or_default();
      let name = unique_name(&label, &mut taken);
      if name != label {
        warn!(retro_id, label = %label, name = %name, "theme label collides with another cluster; renamed");
      }
      Theme {
        name,
        retro_id: retro_id.to_string(),
        feedback_ids: indices.iter().map(|&i| items[i].id.clone()).collect(),
        theme_type: theme_type.to_string(),
        embedding: indices.first().and_then(|&i| embeddings.get(i)).cloned(),
      }
    })
    .collect()
}

// themes are keyed by (retro_id, name), so two clusters must never share a name
fn unique_name(label: &str, taken: &mut HashSet<String>) -> String {
  let mut name = label.to_string();
  let mut suffix = 2;
  while !taken.insert(name.clone()) {
    name = format!("{label} ({suffix})");
    suffix += 1;
  }
  name
}
