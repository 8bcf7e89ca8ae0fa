use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::extract::{AppJson, AppPath};
use crate::error::AppError;
use crate::models::{CommentId, EssayId};
use crate::response::CommentResponse;
use crate::service::ensure_participant;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CommentBody {
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct CommentListResponse {
    pub comments: Vec<CommentResponse>,
}

pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    AppPath(essay_id): AppPath<i64>,
    AppJson(body): AppJson<CommentBody>,
) -> Result<(StatusCode, Json<CommentResponse>), AppError> {
    let comment = state
        .comments
        .create_comment(EssayId(essay_id), &user, &body.detail)
        .await?;
    Ok((StatusCode::CREATED, Json(CommentResponse::from(&comment))))
}

pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    AppPath(essay_id): AppPath<i64>,
) -> Result<Json<CommentListResponse>, AppError> {
    let essay = state.essays.get_essay_by_id(EssayId(essay_id)).await?;
    ensure_participant(&essay, &user)?;

    let comments = state.comments.get_comments(essay.id).await?;
    Ok(Json(CommentListResponse {
        comments: comments.iter().map(CommentResponse::from).collect(),
    }))
}

pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    AppPath((essay_id, comment_id)): AppPath<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    state
        .comments
        .delete_comment(EssayId(essay_id), CommentId(comment_id), &user)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
