mod auth;
mod comment;
mod essay;
mod extract;
mod files;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health))
        .route("/profiles/:profile_id/essay", post(essay::create_essay))
        .route("/essay/request", get(essay::list_requested))
        .route("/essay/proceed", get(essay::list_proceeding))
        .route("/essay/reject", get(essay::list_rejected))
        .route("/essay/complete", get(essay::list_completed))
        .route("/essay/request/:id", get(essay::get_requested))
        .route("/essay/proceed/:id", get(essay::get_proceeding))
        .route("/essay/reject/:id", get(essay::get_rejected))
        .route("/essay/complete/:id", get(essay::get_completed))
        .route("/essay/request/:id/accept", put(essay::accept_essay))
        .route("/essay/request/:id/reject", put(essay::reject_essay))
        .route("/essay/proceed/:id/upload", post(essay::upload_teacher_file))
        .route("/essay/proceed/:id/complete", put(essay::complete_essay))
        .route("/essay/complete/:id/review", post(essay::review_essay))
        .route(
            "/essay/:id/comments",
            get(comment::list_comments).post(comment::create_comment),
        )
        .route(
            "/essay/:id/comments/:comment_id",
            delete(comment::delete_comment),
        )
        .route("/files/:name", get(files::download_file))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "sulsul" }))
}
