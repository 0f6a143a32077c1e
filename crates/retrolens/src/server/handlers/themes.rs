//! Theme identification endpoint handler

use axum::{
  extract::{rejection::JsonRejection, Extension, Json, State},
  http::StatusCode,
  response::Json as ResponseJson,
};

use crate::server::middleware::RequestContext;
use crate::server::types::ThemesErrorBody;
use crate::server::AppState;
use crate::themes::{ThemeReport, ThemeRequest, ThemesError};

type ThemesFailure = (StatusCode, ResponseJson<ThemesErrorBody>);

fn themes_failure(status: StatusCode, error: &str, details: Option<String>) -> ThemesFailure {
  (status, ResponseJson(ThemesErrorBody::new(error, details)))
}

/// POST /themes - Cluster a retrospective's feedback into named themes
///
/// Responds with a bare `{message, themes}` body on success and
/// `{error, details}` on failure.
pub async fn identify_themes(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
  body: Result<Json<ThemeRequest>, JsonRejection>,
) -> Result<ResponseJson<ThemeReport>, ThemesFailure> {
  let Some(service) = state.themes.as_ref() else {
    context.log_error("Theme request received but no embedding API key is configured");
    return Err(themes_failure(
      StatusCode::INTERNAL_SERVER_ERROR,
      "OpenAI API key not configured",
      Some("Set OPENAI_API_KEY and restart the server".to_string()),
    ));
  };

  let Json(request) = body.map_err(|rejection| {
    context.log_warn(&format!("Could not parse theme request: {rejection}"));
    themes_failure(StatusCode::BAD_REQUEST, "Invalid request format", Some(rejection.body_text()))
  })?;

  match service.identify_themes(&request).await {
    Ok(report) => {
      context.log_info(&report.message);
      Ok(ResponseJson(report))
    }
    Err(ThemesError::NoFeedback) => Ok(ResponseJson(ThemeReport {
      message: ThemesError::NoFeedback.to_string(),
      themes: Vec::new(),
    })),
    Err(ThemesError::MissingRetroId) => {
      Err(themes_failure(StatusCode::BAD_REQUEST, "Missing retroId parameter", None))
    }
    Err(ThemesError::FeedbackSource(e)) => {
      context.log_error(&format!("Failed to fetch feedback: {e}"));
      Err(themes_failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch feedback", Some(e.to_string())))
    }
    Err(ThemesError::Embedding(e)) => {
      context.log_error(&format!("Embedding request failed: {e}"));
      Err(themes_failure(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Failed to generate embeddings",
        Some(e.to_string()),
      ))
    }
  }
}
