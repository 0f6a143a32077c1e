//! Persistence gateway for retrospectives, feedback, reactions, and themes
//!
//! The theme pipeline depends only on [`FeedbackSource`] and [`ThemeStore`].
//! [`RetroStore`] adds the CRUD surface the REST server and CLI need. Both
//! shipped implementations keep their state in a [`RetroData`] value and
//! differ only in where it lives.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::feedback::{
  FeedbackItem, FeedbackType, ReactionChange, ReactionCount, ReactionLedger, ReactionType,
  Retrospective,
};
use crate::themes::Theme;

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

#[derive(Error, Debug)]
pub enum StoreError {
  #[error("Retrospective {id} not found")]
  RetroNotFound { id: String },

  #[error("Feedback item {id} not found")]
  FeedbackNotFound { id: String },

  #[error("Store I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Store document is malformed: {0}")]
  Malformed(#[from] serde_json::Error),

  #[error("Store schema version {found} is newer than supported version {supported}")]
  UnsupportedSchema { found: u64, supported: u64 },
}

impl StoreError {
  pub fn retro_not_found(id: impl Into<String>) -> Self {
    Self::RetroNotFound { id: id.into() }
  }

  pub fn feedback_not_found(id: impl Into<String>) -> Self {
    Self::FeedbackNotFound { id: id.into() }
  }
}

/// Read-only snapshot of a retrospective's feedback
#[async_trait]
pub trait FeedbackSource: Send + Sync {
  async fn feedback_for(
    &self,
    retro_id: &str,
    feedback_type: Option<FeedbackType>,
  ) -> Result<Vec<FeedbackItem>, StoreError>;
}

/// Theme persistence, keyed by (retro_id, name)
#[async_trait]
pub trait ThemeStore: Send + Sync {
  /// Insert or overwrite themes; returns the saved rows
  async fn upsert_themes(&self, themes: &[Theme]) -> Result<Vec<Theme>, StoreError>;

  async fn themes_for(&self, retro_id: &str) -> Result<Vec<Theme>, StoreError>;
}

/// Full persistence surface used by the server and CLI
#[async_trait]
pub trait RetroStore: FeedbackSource + ThemeStore {
  async fn create_retro(&self, retro: Retrospective) -> Result<Retrospective, StoreError>;

  async fn get_retro(&self, id: &str) -> Result<Retrospective, StoreError>;

  async fn list_retros(&self) -> Result<Vec<Retrospective>, StoreError>;

  async fn add_feedback(&self, item: FeedbackItem) -> Result<FeedbackItem, StoreError>;

  async fn toggle_reaction(
    &self,
    feedback_id: &str,
    user_id: &str,
    reaction: ReactionType,
  ) -> Result<(ReactionChange, ReactionCount), StoreError>;

  async fn reactions_for(&self, feedback_id: &str) -> Result<ReactionCount, StoreError>;

  /// The user's current reaction on an item, if any
  async fn user_reaction(&self, feedback_id: &str, user_id: &str) -> Result<Option<ReactionType>, StoreError>;
}

/// Everything a store persists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetroData {
  #[serde(default)]
  pub retrospectives: Vec<Retrospective>,
  #[serde(default)]
  pub feedback: Vec<FeedbackItem>,
  #[serde(default)]
  pub themes: Vec<Theme>,
  #[serde(default)]
  pub reactions: ReactionLedger,
}

impl RetroData {
  pub fn feedback_for(&self, retro_id: &str, feedback_type: Option<FeedbackType>) -> Vec<FeedbackItem> {
    self
      .feedback
      .iter()
      .filter(|item| item.retro_id == retro_id)
      .filter(|item| feedback_type.map_or(true, |t| item.feedback_type == t))
      .cloned()
      .collect()
  }

  /// Overwrite themes sharing (retro_id, name), append the rest
  pub fn upsert_themes(&mut self, themes: &[Theme]) -> Vec<Theme> {
    for theme in themes {
      match self.themes.iter_mut().find(|t| t.retro_id == theme.retro_id && t.name == theme.name) {
        Some(existing) => *existing = theme.clone(),
        None => self.themes.push(theme.clone()),
      }
    }
    themes.to_vec()
  }

  pub fn themes_for(&self, retro_id: &str) -> Vec<Theme> {
    self.themes.iter().filter(|t| t.retro_id == retro_id).cloned().collect()
  }

  pub fn create_retro(&mut self, retro: Retrospective) -> Retrospective {
    self.retrospectives.push(retro.clone());
    retro
  }

  pub fn get_retro(&self, id: &str) -> Result<Retrospective, StoreError> {
    self
      .retrospectives
      .iter()
      .find(|r| r.id == id)
      .cloned()
      .ok_or_else(|| StoreError::retro_not_found(id))
  }

  pub fn add_feedback(&mut self, item: FeedbackItem) -> Result<FeedbackItem, StoreError> {
    self.get_retro(&item.retro_id)?;
    self.feedback.push(item.clone());
    Ok(item)
  }

  pub fn toggle_reaction(
    &mut self,
    feedback_id: &str,
    user_id: &str,
    reaction: ReactionType,
  ) -> Result<(ReactionChange, ReactionCount), StoreError> {
    if !self.feedback.iter().any(|f| f.id == feedback_id) {
      return Err(StoreError::feedback_not_found(feedback_id));
    }
    let change = self.reactions.toggle(feedback_id, user_id, reaction);
    Ok((change, self.reactions.counts(feedback_id)))
  }
}
