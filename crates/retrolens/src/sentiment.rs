//! Sentiment arithmetic over feedback category counts, per retrospective
//! and as a trend across a team's recent retrospectives

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::feedback::{FeedbackItem, FeedbackType, Retrospective};
use crate::store::{RetroStore, StoreError};

const WELL_WEIGHT: f64 = 1.0;
const DIDNT_WEIGHT: f64 = -0.7;
const BLOCKER_WEIGHT: f64 = -1.0;
const SUGGESTION_WEIGHT: f64 = 0.1;

/// Retrospectives shown on a trend when no limit is given
pub const DEFAULT_TREND_LIMIT: usize = 10;

/// Team filter value that matches every team
pub const ALL_TEAMS: &str = "all";

/// Per-category feedback counts for one retrospective
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FeedbackSummary {
  pub well_count: u32,
  pub didnt_count: u32,
  pub blocker_count: u32,
  pub suggestion_count: u32,
  pub total_count: u32,
}

impl FeedbackSummary {
  pub fn from_items(items: &[FeedbackItem]) -> Self {
    items.iter().fold(Self::default(), |mut summary, item| {
      match item.feedback_type {
        FeedbackType::Well => summary.well_count += 1,
        FeedbackType::Didnt => summary.didnt_count += 1,
        FeedbackType::Blocker => summary.blocker_count += 1,
        FeedbackType::Suggestion => summary.suggestion_count += 1,
      }
      summary.total_count += 1;
      summary
    })
  }
}

/// Sentiment in [-1, 1]; neutral when there is no feedback
pub fn sentiment_score(summary: &FeedbackSummary) -> f64 {
  if summary.total_count == 0 {
    return 0.0;
  }

  let positive = f64::from(summary.well_count) * WELL_WEIGHT;
  let negative =
    f64::from(summary.didnt_count) * DIDNT_WEIGHT + f64::from(summary.blocker_count) * BLOCKER_WEIGHT;
  let suggestions = f64::from(summary.suggestion_count) * SUGGESTION_WEIGHT;

  let max_possible = f64::from(summary.total_count) * WELL_WEIGHT;
  ((positive + negative + suggestions) / max_possible).clamp(-1.0, 1.0)
}

/// One retrospective on a sentiment trend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SentimentPoint {
  pub retro_id: String,
  pub sprint_title: String,
  pub team_name: String,
  pub created_at: DateTime<Utc>,
  pub score: f64,
  pub summary: FeedbackSummary,
}

impl SentimentPoint {
  pub fn new(retro: &Retrospective, summary: FeedbackSummary) -> Self {
    Self {
      retro_id: retro.id.clone(),
      sprint_title: retro.sprint_title(),
      team_name: retro.team_name.clone(),
      created_at: retro.created_at,
      score: sentiment_score(&summary),
      summary,
    }
  }
}

/// Pick the retrospectives a trend covers: the team's most recent `limit`,
/// oldest first. A missing, blank, or `all` team matches every team and a
/// zero limit keeps everything.
pub fn trend_window(mut retros: Vec<Retrospective>, team: Option<&str>, limit: usize) -> Vec<Retrospective> {
  if let Some(team) = team.map(str::trim).filter(|t| !t.is_empty() && *t != ALL_TEAMS) {
    retros.retain(|retro| retro.team_name == team);
  }

  retros.sort_by_key(|retro| retro.created_at);
  if limit > 0 && retros.len() > limit {
    retros.drain(..retros.len() - limit);
  }
  retros
}

/// Sentiment for each retrospective in the trend window
pub async fn sentiment_trend(
  store: &dyn RetroStore,
  team: Option<&str>,
  limit: usize,
) -> Result<Vec<SentimentPoint>, StoreError> {
  let retros = trend_window(store.list_retros().await?, team, limit);

  let mut points = Vec::with_capacity(retros.len());
  for retro in &retros {
    let summary = FeedbackSummary::from_items(&store.feedback_for(&retro.id, None).await?);
    points.push(SentimentPoint::new(retro, summary));
  }
  Ok(points)
}
