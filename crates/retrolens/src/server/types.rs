//! REST API types with schemars annotations for OpenAPI generation

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::feedback::{
  FeedbackItem, FeedbackType, ReactionChange, ReactionCount, ReactionType, Retrospective,
};
use crate::sentiment::{FeedbackSummary, SentimentPoint};

// Base Response Structure
// ======================

/// Base response object for the retrospective endpoints
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BaseResponse<T> {
  /// API versioning information
  pub versioning: VersionInfo,

  /// Transaction ID for logging correlation
  pub transaction_id: Uuid,

  #[serde(skip_serializing_if = "Vec::is_empty", default)]
  pub errors: Vec<ApiError>,

  #[serde(flatten)]
  pub data: T,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VersionInfo {
  pub latest: String,
  pub requested: String,
  pub resolved: String,
}

/// API error information
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ApiError {
  /// Error key, unique to the error source
  pub key: String,

  /// Human readable error message
  pub message: String,

  #[serde(default)]
  pub context: serde_json::Value,
}

/// Error body returned by `POST /themes`
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ThemesErrorBody {
  pub error: String,
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub details: Option<String>,
}

impl ThemesErrorBody {
  pub fn new(error: &str, details: Option<String>) -> Self {
    Self { error: error.to_string(), details }
  }
}

// Status/Version Endpoints
// =======================

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct StatusResponse {
  pub status: String,
  pub version: String,
  /// False when no embedding API key is configured
  pub themes_enabled: bool,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VersionResponse {
  pub version: String,
}

// Retrospective Endpoints
// =======================

/// Request for POST /retros
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CreateRetroRequest {
  #[serde(default)]
  pub sprint_name: String,

  #[serde(default)]
  pub sprint_number: Option<u32>,

  pub team_name: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RetroResponse {
  pub retro: Retrospective,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListRetrosResponse {
  pub retros: Vec<Retrospective>,
}

/// Response for GET /retros/{id}/sentiment
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SentimentResponse {
  /// Score in [-1, 1]
  pub score: f64,
  pub summary: FeedbackSummary,
}

/// Query for GET /sentiment/trends
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct TrendQuery {
  /// Only this team's retrospectives; `all` or omitted for every team
  pub team: Option<String>,
  /// Most recent retrospectives to include
  pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SentimentTrendResponse {
  /// Oldest first
  pub points: Vec<SentimentPoint>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct MarkdownResponse {
  pub markdown: String,
}

// Feedback Endpoints
// ==================

/// Request for POST /feedback
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct AddFeedbackRequest {
  pub retro_id: String,

  #[serde(rename = "type")]
  pub feedback_type: FeedbackType,

  pub message: String,

  /// Author email; the item stays anonymous when omitted
  #[serde(default)]
  pub user_email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct FeedbackResponse {
  pub feedback: FeedbackItem,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListFeedbackResponse {
  pub feedback: Vec<FeedbackItem>,
}

/// Request for POST /feedback/{id}/reactions
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ReactionRequest {
  pub user_id: String,
  pub reaction_type: ReactionType,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ReactionResponse {
  pub change: ReactionChange,
  pub counts: ReactionCount,
  /// The user's reaction after the toggle; `None` once removed
  pub user_reaction: Option<ReactionType>,
}

/// Query for GET /feedback/{id}/reactions
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ReactionQuery {
  pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ReactionStateResponse {
  pub counts: ReactionCount,
  pub user_reaction: Option<ReactionType>,
}

// Helper Functions
// ================

impl<T> BaseResponse<T> {
  pub fn success(data: T, transaction_id: Uuid) -> Self {
    Self { versioning: VersionInfo::current(), transaction_id, errors: Vec::new(), data }
  }

  pub fn error(errors: Vec<ApiError>, transaction_id: Uuid) -> BaseResponse<()> {
    BaseResponse { versioning: VersionInfo::current(), transaction_id, errors, data: () }
  }
}

impl VersionInfo {
  fn current() -> Self {
    let version = env!("CARGO_PKG_VERSION");
    Self { latest: version.to_string(), requested: version.to_string(), resolved: version.to_string() }
  }
}

impl ApiError {
  pub fn new(key: &str, message: &str) -> Self {
    Self { key: key.to_string(), message: message.to_string(), context: serde_json::Value::Null }
  }
}
