pub mod feedback;
pub mod retros;
pub mod status;
pub mod themes;

use axum::{http::StatusCode, response::Json as ResponseJson};
use uuid::Uuid;

use crate::server::types::{ApiError, BaseResponse};
use crate::store::StoreError;

pub(crate) type HandlerError = (StatusCode, ResponseJson<BaseResponse<()>>);

pub(crate) fn failure(status: StatusCode, key: &str, message: &str, transaction_id: Uuid) -> HandlerError {
  let error = ApiError::new(key, message);
  (status, ResponseJson(BaseResponse::<()>::error(vec![error], transaction_id)))
}

/// Missing records are 404s, everything else is a server fault
pub(crate) fn store_failure(e: &StoreError, transaction_id: Uuid) -> HandlerError {
  match e {
    StoreError::RetroNotFound { .. } => {
      failure(StatusCode::NOT_FOUND, "retro_not_found", &e.to_string(), transaction_id)
    }
    StoreError::FeedbackNotFound { .. } => {
      failure(StatusCode::NOT_FOUND, "feedback_not_found", &e.to_string(), transaction_id)
    }
    _ => failure(StatusCode::INTERNAL_SERVER_ERROR, "store_error", &e.to_string(), transaction_id),
  }
}
