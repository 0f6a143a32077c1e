//! Retrospectives, feedback items, and reactions

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Feedback category a participant files an item under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackType {
  Well,
  Didnt,
  Suggestion,
  Blocker,
}

impl FeedbackType {
  pub const ALL: [FeedbackType; 4] =
    [FeedbackType::Well, FeedbackType::Didnt, FeedbackType::Blocker, FeedbackType::Suggestion];

  pub fn as_str(&self) -> &'static str {
    match self {
      FeedbackType::Well => "well",
      FeedbackType::Didnt => "didnt",
      FeedbackType::Suggestion => "suggestion",
      FeedbackType::Blocker => "blocker",
    }
  }
}

impl fmt::Display for FeedbackType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for FeedbackType {
  type Err = String;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value.trim().to_lowercase().as_str() {
      "well" => Ok(FeedbackType::Well),
      "didnt" => Ok(FeedbackType::Didnt),
      "suggestion" => Ok(FeedbackType::Suggestion),
      "blocker" => Ok(FeedbackType::Blocker),
      other => Err(format!("Unknown feedback type '{other}'")),
    }
  }
}

/// A team feedback session scoped to a sprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Retrospective {
  pub id: String,
  pub sprint_name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sprint_number: Option<u32>,
  pub team_name: String,
  pub created_at: DateTime<Utc>,
}

impl Retrospective {
  pub fn new(sprint_name: String, sprint_number: Option<u32>, team_name: String) -> Self {
    Self {
      id: Uuid::new_v4().to_string(),
      sprint_name,
      sprint_number,
      team_name,
      created_at: Utc::now(),
    }
  }

  /// Sprint title used in headings; falls back to the sprint number
  pub fn sprint_title(&self) -> String {
    if !self.sprint_name.trim().is_empty() {
      return self.sprint_name.clone();
    }
    match self.sprint_number {
      Some(number) => format!("Sprint {number}"),
      None => "Sprint".to_string(),
    }
  }
}

/// A single categorized piece of text submitted against a retrospective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FeedbackItem {
  pub id: String,
  pub retro_id: String,
  #[serde(rename = "type")]
  pub feedback_type: FeedbackType,
  pub message: String,
  #[serde(default)]
  pub anonymous: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub user_email: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl FeedbackItem {
  pub fn new(retro_id: &str, feedback_type: FeedbackType, message: &str) -> Self {
    Self {
      id: Uuid::new_v4().to_string(),
      retro_id: retro_id.to_string(),
      feedback_type,
      message: message.to_string(),
      anonymous: true,
      user_email: None,
      created_at: Utc::now(),
    }
  }

  /// Attribute the item to a user; attributed items are not anonymous
  pub fn with_author(mut self, email: &str) -> Self {
    self.anonymous = false;
    self.user_email = Some(email.to_string());
    self
  }

  /// Attribute the item only when a non-blank email is given
  pub fn with_optional_author(self, email: Option<&str>) -> Self {
    match email.map(str::trim).filter(|e| !e.is_empty()) {
      Some(email) => self.with_author(email),
      None => self,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReactionType {
  Thumbsup,
  Thumbsdown,
}

impl ReactionType {
  pub fn emoji(&self) -> &'static str {
    match self {
      ReactionType::Thumbsup => "👍",
      ReactionType::Thumbsdown => "👎",
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReactionCount {
  pub thumbsup: u32,
  pub thumbsdown: u32,
}

impl ReactionCount {
  pub fn is_empty(&self) -> bool {
    self.thumbsup == 0 && self.thumbsdown == 0
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
  pub feedback_id: String,
  pub user_id: String,
  pub reaction_type: ReactionType,
}

/// What a toggle did to a user's reaction on one feedback item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReactionChange {
  Added,
  Removed,
  Switched,
}

/// All reactions, at most one per (feedback item, user)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReactionLedger {
  reactions: Vec<Reaction>,
}

impl ReactionLedger {
  /// Toggle a user's reaction: same type removes it, the opposite type is replaced
  pub fn toggle(&mut self, feedback_id: &str, user_id: &str, reaction_type: ReactionType) -> ReactionChange {
    let existing = self
      .reactions
      .iter()
      .position(|r| r.feedback_id == feedback_id && r.user_id == user_id);

    match existing {
      Some(index) if self.reactions[index].reaction_type == reaction_type => {
        self.reactions.remove(index);
        ReactionChange::Removed
      }
      Some(index) => {
        self.reactions[index].reaction_type = reaction_type;
        ReactionChange::Switched
      }
      None => {
        self.reactions.push(Reaction {
          feedback_id: feedback_id.to_string(),
          user_id: user_id.to_string(),
          reaction_type,
        });
        ReactionChange::Added
      }
    }
  }

  pub fn counts(&self, feedback_id: &str) -> ReactionCount {
    self.reactions.iter().filter(|r| r.feedback_id == feedback_id).fold(
      ReactionCount::default(),
      |mut counts, r| {
        match r.reaction_type {
          ReactionType::Thumbsup => counts.thumbsup += 1,
          ReactionType::Thumbsdown => counts.thumbsdown += 1,
        }
        counts
      },
    )
  }

  pub fn user_reaction(&self, feedback_id: &str, user_id: &str) -> Option<ReactionType> {
    self
      .reactions
      .iter()
      .find(|r| r.feedback_id == feedback_id && r.user_id == user_id)
      .map(|r| r.reaction_type)
  }
}
