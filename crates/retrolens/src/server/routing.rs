//! Axum router configuration for all endpoints

use axum::{
  middleware,
  routing::{get, post},
  Router,
};

use crate::server::handlers::{feedback, retros, status, themes};
use crate::server::middleware::request_context_middleware;
use crate::server::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
  Router::new()
    // Status and version endpoints
    .route("/status", get(status::status))
    .route("/version", get(status::version))
    // Retrospective endpoints
    .route("/retros", post(retros::create_retro).get(retros::list_retros))
    .route("/retros/{id}/feedback", get(feedback::list_feedback))
    .route("/retros/{id}/sentiment", get(retros::sentiment))
    .route("/retros/{id}/export/markdown", get(retros::export_markdown))
    .route("/sentiment/trends", get(retros::sentiment_trends))
    // Feedback endpoints
    .route("/feedback", post(feedback::add_feedback))
    .route("/feedback/{id}/reactions", post(feedback::toggle_reaction).get(feedback::reaction_state))
    // Theme identification
    .route("/themes", post(themes::identify_themes))
    .layer(middleware::from_fn(request_context_middleware))
    .with_state(state)
}
