//! Feedback and reaction endpoint handlers

use axum::{
  extract::{Extension, Json, Path, Query, State},
  http::StatusCode,
  response::Json as ResponseJson,
};
use uuid::Uuid;

use super::{failure, store_failure, HandlerError};
use crate::feedback::FeedbackItem;
use crate::server::middleware::RequestContext;
use crate::server::types::{
  AddFeedbackRequest, BaseResponse, FeedbackResponse, ListFeedbackResponse, ReactionQuery,
  ReactionRequest, ReactionResponse, ReactionStateResponse,
};
use crate::server::AppState;

/// POST /feedback - Add a feedback item to a retrospective
pub async fn add_feedback(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
  Json(request): Json<AddFeedbackRequest>,
) -> Result<ResponseJson<BaseResponse<FeedbackResponse>>, HandlerError> {
  let transaction_id = Uuid::new_v4();

  if request.message.trim().is_empty() {
    return Err(failure(StatusCode::BAD_REQUEST, "empty_message", "Feedback message is required", transaction_id));
  }

  let item = FeedbackItem::new(&request.retro_id, request.feedback_type, request.message.trim())
    .with_optional_author(request.user_email.as_deref());

  match state.store.add_feedback(item).await {
    Ok(feedback) => {
      context.log_info(&format!("Added {} feedback to {}", feedback.feedback_type, feedback.retro_id));
      Ok(ResponseJson(BaseResponse::success(FeedbackResponse { feedback }, transaction_id)))
    }
    Err(e) => {
      context.log_warn(&format!("Failed to add feedback: {e}"));
      Err(store_failure(&e, transaction_id))
    }
  }
}

/// GET /retros/{id}/feedback - All feedback for a retrospective
pub async fn list_feedback(
  State(state): State<AppState>,
  Path(retro_id): Path<String>,
) -> Result<ResponseJson<BaseResponse<ListFeedbackResponse>>, HandlerError> {
  let transaction_id = Uuid::new_v4();

  state.store.get_retro(&retro_id).await.map_err(|e| store_failure(&e, transaction_id))?;
  let feedback =
    state.store.feedback_for(&retro_id, None).await.map_err(|e| store_failure(&e, transaction_id))?;

  Ok(ResponseJson(BaseResponse::success(ListFeedbackResponse { feedback }, transaction_id)))
}

/// POST /feedback/{id}/reactions - Toggle a user's reaction
pub async fn toggle_reaction(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
  Path(feedback_id): Path<String>,
  Json(request): Json<ReactionRequest>,
) -> Result<ResponseJson<BaseResponse<ReactionResponse>>, HandlerError> {
  let transaction_id = Uuid::new_v4();

  if request.user_id.trim().is_empty() {
    return Err(failure(StatusCode::BAD_REQUEST, "missing_user_id", "User ID is required", transaction_id));
  }

  let user_id = request.user_id.trim();
  let (change, counts) =
    state.store.toggle_reaction(&feedback_id, user_id, request.reaction_type).await.map_err(|e| {
      context.log_warn(&format!("Reaction toggle failed: {e}"));
      store_failure(&e, transaction_id)
    })?;
  let user_reaction =
    state.store.user_reaction(&feedback_id, user_id).await.map_err(|e| store_failure(&e, transaction_id))?;

  Ok(ResponseJson(BaseResponse::success(ReactionResponse { change, counts, user_reaction }, transaction_id)))
}

/// GET /feedback/{id}/reactions - Reaction counts, plus the caller's own reaction when `user_id` is given
pub async fn reaction_state(
  State(state): State<AppState>,
  Path(feedback_id): Path<String>,
  Query(query): Query<ReactionQuery>,
) -> Result<ResponseJson<BaseResponse<ReactionStateResponse>>, HandlerError> {
  let transaction_id = Uuid::new_v4();

  let counts = state.store.reactions_for(&feedback_id).await.map_err(|e| store_failure(&e, transaction_id))?;
  let user_reaction = match query.user_id.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
    Some(user_id) => {
      state.store.user_reaction(&feedback_id, user_id).await.map_err(|e| store_failure(&e, transaction_id))?
    }
    None => None,
  };

  Ok(ResponseJson(BaseResponse::success(ReactionStateResponse { counts, user_reaction }, transaction_id)))
}
