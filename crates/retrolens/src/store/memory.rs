use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{FeedbackSource, RetroData, RetroStore, StoreError, ThemeStore};
use crate::feedback::{
  FeedbackItem, FeedbackType, ReactionChange, ReactionCount, ReactionType, Retrospective,
};
use crate::themes::Theme;

/// Process-local store; contents vanish with the process
#[derive(Default)]
pub struct MemoryStore {
  data: RwLock<RetroData>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn snapshot(&self) -> RetroData {
    self.data.read().await.clone()
  }
}

#[async_trait]
impl FeedbackSource for MemoryStore {
  async fn feedback_for(
    &self,
    retro_id: &str,
    feedback_type: Option<FeedbackType>,
  ) -> Result<Vec<FeedbackItem>, StoreError> {
    Ok(self.data.read().await.feedback_for(retro_id, feedback_type))
  }
}

#[async_trait]
impl ThemeStore for MemoryStore {
  async fn upsert_themes(&self, themes: &[Theme]) -> Result<Vec<Theme>, StoreError> {
    Ok(self.data.write().await.upsert_themes(themes))
  }

  async fn themes_for(&self, retro_id: &str) -> Result<Vec<Theme>, StoreError> {
    Ok(self.data.read().await.themes_for(retro_id))
  }
}

#[async_trait]
impl RetroStore for MemoryStore {
  async fn create_retro(&self, retro: Retrospective) -> Result<Retrospective, StoreError> {
    Ok(self.data.write().await.create_retro(retro))
  }

  async fn get_retro(&self, id: &str) -> Result<Retrospective, StoreError> {
    self.data.read().await.get_retro(id)
  }

  async fn list_retros(&self) -> Result<Vec<Retrospective>, StoreError> {
    Ok(self.data.read().await.retrospectives.clone())
  }

  async fn add_feedback(&self, item: FeedbackItem) -> Result<FeedbackItem, StoreError> {
    self.data.write().await.add_feedback(item)
  }

  async fn toggle_reaction(
    &self,
    feedback_id: &str,
    user_id: &str,
    reaction: ReactionType,
  ) -> Result<(ReactionChange, ReactionCount), StoreError> {
    self.data.write().await.toggle_reaction(feedback_id, user_id, reaction)
  }

  async fn reactions_for(&self, feedback_id: &str) -> Result<ReactionCount, StoreError> {
    Ok(self.data.read().await.reactions.counts(feedback_id))
  }

  async fn user_reaction(&self, feedback_id: &str, user_id: &str) -> Result<Option<ReactionType>, StoreError> {
    Ok(self.data.read().await.reactions.user_reaction(feedback_id, user_id))
  }
}
