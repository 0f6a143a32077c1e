//! Retrospective endpoint handlers

use axum::{
  extract::{Extension, Json, Path, Query, State},
  http::StatusCode,
  response::Json as ResponseJson,
};
use chrono::Utc;
use uuid::Uuid;

use super::{failure, store_failure, HandlerError};
use crate::export::{self, RetroExport};
use crate::feedback::Retrospective;
use crate::sentiment::{sentiment_score, sentiment_trend, FeedbackSummary, DEFAULT_TREND_LIMIT};
use crate::server::middleware::RequestContext;
use crate::server::types::{
  BaseResponse, CreateRetroRequest, ListRetrosResponse, MarkdownResponse, RetroResponse,
  SentimentResponse, SentimentTrendResponse, TrendQuery,
};
use crate::server::AppState;

/// POST /retros - Create a retrospective
pub async fn create_retro(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
  Json(request): Json<CreateRetroRequest>,
) -> Result<ResponseJson<BaseResponse<RetroResponse>>, HandlerError> {
  let transaction_id = Uuid::new_v4();

  if request.team_name.trim().is_empty() {
    return Err(failure(StatusCode::BAD_REQUEST, "missing_team_name", "Team name is required", transaction_id));
  }

  let retro = Retrospective::new(request.sprint_name, request.sprint_number, request.team_name);
  match state.store.create_retro(retro).await {
    Ok(retro) => {
      context.log_info(&format!("Created retrospective {} for team {}", retro.id, retro.team_name));
      Ok(ResponseJson(BaseResponse::success(RetroResponse { retro }, transaction_id)))
    }
    Err(e) => {
      context.log_error(&format!("Failed to create retrospective: {e}"));
      Err(store_failure(&e, transaction_id))
    }
  }
}

/// GET /retros - List all retrospectives
pub async fn list_retros(
  State(state): State<AppState>,
) -> Result<ResponseJson<BaseResponse<ListRetrosResponse>>, HandlerError> {
  let transaction_id = Uuid::new_v4();

  let retros = state.store.list_retros().await.map_err(|e| store_failure(&e, transaction_id))?;
  Ok(ResponseJson(BaseResponse::success(ListRetrosResponse { retros }, transaction_id)))
}

/// GET /retros/{id}/sentiment - Sentiment score over all feedback
pub async fn sentiment(
  State(state): State<AppState>,
  Path(retro_id): Path<String>,
) -> Result<ResponseJson<BaseResponse<SentimentResponse>>, HandlerError> {
  let transaction_id = Uuid::new_v4();

  state.store.get_retro(&retro_id).await.map_err(|e| store_failure(&e, transaction_id))?;
  let feedback =
    state.store.feedback_for(&retro_id, None).await.map_err(|e| store_failure(&e, transaction_id))?;

  let summary = FeedbackSummary::from_items(&feedback);
  let response = SentimentResponse { score: sentiment_score(&summary), summary };
  Ok(ResponseJson(BaseResponse::success(response, transaction_id)))
}

/// GET /sentiment/trends - Sentiment across the most recent retrospectives
pub async fn sentiment_trends(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
  Query(query): Query<TrendQuery>,
) -> Result<ResponseJson<BaseResponse<SentimentTrendResponse>>, HandlerError> {
  let transaction_id = Uuid::new_v4();

  let limit = query.limit.unwrap_or(DEFAULT_TREND_LIMIT);
  let points = sentiment_trend(state.store.as_ref(), query.team.as_deref(), limit).await.map_err(|e| {
    context.log_error(&format!("Failed to build sentiment trend: {e}"));
    store_failure(&e, transaction_id)
  })?;

  Ok(ResponseJson(BaseResponse::success(SentimentTrendResponse { points }, transaction_id)))
}

/// GET /retros/{id}/export/markdown - Markdown summary of the retrospective
pub async fn export_markdown(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
  Path(retro_id): Path<String>,
) -> Result<ResponseJson<BaseResponse<MarkdownResponse>>, HandlerError> {
  let transaction_id = Uuid::new_v4();

  let data = match RetroExport::load(state.store.as_ref(), &retro_id).await {
    Ok(data) => data,
    Err(e) => {
      context.log_warn(&format!("Export of {retro_id} failed: {e}"));
      return Err(store_failure(&e, transaction_id));
    }
  };

  let markdown = export::to_markdown(&data, Utc::now().date_naive());
  Ok(ResponseJson(BaseResponse::success(MarkdownResponse { markdown }, transaction_id)))
}
