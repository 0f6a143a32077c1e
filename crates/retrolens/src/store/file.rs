//! JSON document store with an explicit schema version
//!
//! The whole store is one JSON document. Older documents are upgraded by
//! [`migrate`] when loaded; documents from a newer release are refused
//! rather than guessed at.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{FeedbackSource, RetroData, RetroStore, StoreError, ThemeStore};
use crate::feedback::{
  FeedbackItem, FeedbackType, ReactionChange, ReactionCount, ReactionType, Retrospective,
};
use crate::themes::Theme;

pub const SCHEMA_VERSION: u64 = 2;

#[derive(Serialize, Deserialize)]
struct StoreDocument {
  schema_version: u64,
  #[serde(flatten)]
  data: RetroData,
}

pub struct FileStore {
  path: PathBuf,
  lock: Mutex<()>,
}

impl FileStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into(), lock: Mutex::new(()) }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  async fn load(&self) -> Result<RetroData, StoreError> {
    let raw = match tokio::fs::read_to_string(&self.path).await {
      Ok(raw) => raw,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(RetroData::default()),
      Err(e) => return Err(e.into()),
    };

    let document: StoreDocument = serde_json::from_value(migrate(serde_json::from_str(&raw)?)?)?;
    Ok(document.data)
  }

  async fn save(&self, data: RetroData) -> Result<(), StoreError> {
    if let Some(parent) = self.path.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }

    let document = StoreDocument { schema_version: SCHEMA_VERSION, data };
    let json = serde_json::to_string_pretty(&document)?;

    // replace atomically via a sibling temp file
    let tmp = self.path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, &self.path).await?;
    debug!(path = %self.path.display(), "store saved");
    Ok(())
  }

  async fn read<T>(&self, f: impl FnOnce(&RetroData) -> T) -> Result<T, StoreError> {
    let _guard = self.lock.lock().await;
    let data = self.load().await?;
    Ok(f(&data))
  }

  async fn update<T>(
    &self,
    f: impl FnOnce(&mut RetroData) -> Result<T, StoreError>,
  ) -> Result<T, StoreError> {
    let _guard = self.lock.lock().await;
    let mut data = self.load().await?;
    let result = f(&mut data)?;
    self.save(data).await?;
    Ok(result)
  }
}

/// Upgrade a raw document to [`SCHEMA_VERSION`]
///
/// Documents without a `schema_version` field predate versioning and are
/// treated as version 1.
pub fn migrate(mut document: Value) -> Result<Value, StoreError> {
  let version = document.get("schema_version").and_then(Value::as_u64).unwrap_or(1);

  if version > SCHEMA_VERSION {
    return Err(StoreError::UnsupportedSchema { found: version, supported: SCHEMA_VERSION });
  }

  if version < 2 {
    migrate_v1_to_v2(&mut document);
    info!(from = version, to = 2, "migrated store document");
  }

  if let Value::Object(map) = &mut document {
    map.insert("schema_version".to_string(), Value::from(SCHEMA_VERSION));
  }
  Ok(document)
}

// v1 had no reaction ledger and kept sprint numbers as strings
fn migrate_v1_to_v2(document: &mut Value) {
  let Value::Object(map) = document else {
    return;
  };

  map.entry("reactions").or_insert_with(|| Value::Array(Vec::new()));

  if let Some(Value::Array(retros)) = map.get_mut("retrospectives") {
    for retro in retros {
      let Some(number) = retro.get("sprint_number").and_then(Value::as_str).map(str::to_string) else {
        continue;
      };
      retro["sprint_number"] = number.trim().parse::<u32>().map(Value::from).unwrap_or(Value::Null);
    }
  }
}

#[async_trait]
impl FeedbackSource for FileStore {
  async fn feedback_for(
    &self,
    retro_id: &str,
    feedback_type: Option<FeedbackType>,
  ) -> Result<Vec<FeedbackItem>, StoreError> {
    self.read(|data| data.feedback_for(retro_id, feedback_type)).await
  }
}

#[async_trait]
impl ThemeStore for FileStore {
  async fn upsert_themes(&self, themes: &[Theme]) -> Result<Vec<Theme>, StoreError> {
    self.update(|data| Ok(data.upsert_themes(themes))).await
  }

  async fn themes_for(&self, retro_id: &str) -> Result<Vec<Theme>, StoreError> {
    self.read(|data| data.themes_for(retro_id)).await
  }
}

#[async_trait]
impl RetroStore for FileStore {
  async fn create_retro(&self, retro: Retrospective) -> Result<Retrospective, StoreError> {
    self.update(|data| Ok(data.create_retro(retro))).await
  }

  async fn get_retro(&self, id: &str) -> Result<Retrospective, StoreError> {
    self.read(|data| data.get_retro(id)).await?
  }

  async fn list_retros(&self) -> Result<Vec<Retrospective>, StoreError> {
    self.read(|data| data.retrospectives.clone()).await
  }

  async fn add_feedback(&self, item: FeedbackItem) -> Result<FeedbackItem, StoreError> {
    self.update(|data| data.add_feedback(item)).await
  }

  async fn toggle_reaction(
    &self,
    feedback_id: &str,
    user_id: &str,
    reaction: ReactionType,
  ) -> Result<(ReactionChange, ReactionCount), StoreError> {
    self.update(|data| data.toggle_reaction(feedback_id, user_id, reaction)).await
  }

  async fn reactions_for(&self, feedback_id: &str) -> Result<ReactionCount, StoreError> {
    self.read(|data| data.reactions.counts(feedback_id)).await
  }

  async fn user_reaction(&self, feedback_id: &str, user_id: &str) -> Result<Option<ReactionType>, StoreError> {
    self.read(|data| data.reactions.user_reaction(feedback_id, user_id)).await
  }
}
