use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::extract::{AppJson, AppPath};
use crate::error::AppError;
use crate::models::{EssayId, EssayState, ProfileId, TransitionError};
use crate::response::{EssayDetailResponse, EssayListResponse};
use crate::service::{ensure_participant, CreateEssayRequest, ReviewRequest};
use crate::state::AppState;
use crate::storage::UploadedFile;

const FILE_FIELD: &str = "essayFile";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectBody {
    pub reject_detail: String,
}

/// Text fields and the essay file of a multipart form.
struct EssayForm {
    fields: HashMap<String, String>,
    file: Option<UploadedFile>,
}

impl EssayForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut fields = HashMap::new();
        let mut file = None;

        while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
            let name = field.name().unwrap_or("").to_string();
            if name == FILE_FIELD {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(bad_multipart)?;
                file = Some(UploadedFile {
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
            } else {
                let text = field.text().await.map_err(bad_multipart)?;
                fields.insert(name, text);
            }
        }

        Ok(Self { fields, file })
    }

    fn take_file(&mut self) -> Result<UploadedFile, AppError> {
        self.file
            .take()
            .ok_or_else(|| AppError::validation("essayFile", "is required"))
    }

    fn take_text(&mut self, field: &'static str) -> Result<String, AppError> {
        self.fields
            .remove(field)
            .ok_or_else(|| AppError::validation(field, "is required"))
    }
}

fn bad_multipart(err: MultipartError) -> AppError {
    AppError::validation("multipart", err.body_text())
}

pub async fn create_essay(
    State(state): State<Arc<AppState>>,
    AppPath(profile_id): AppPath<i64>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<EssayDetailResponse>), AppError> {
    let mut form = EssayForm::read(multipart).await?;
    let request = CreateEssayRequest {
        univ: form.take_text("univ")?,
        exam_year: form.take_text("examYear")?,
        inquiry: form.fields.remove("inquiry").unwrap_or_default(),
        e_type: form.take_text("eType")?,
        essay_file: form.take_file()?,
    };

    let essay = state
        .essays
        .create_essay(ProfileId(profile_id), &user, request)
        .await?;
    let view = state.essays.project_essay(&essay).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn list(
    state: &AppState,
    user: &crate::models::User,
    essay_state: EssayState,
) -> Result<Json<EssayListResponse>, AppError> {
    let essays = state.essays.get_essays_by_user(user, essay_state).await?;
    Ok(Json(EssayListResponse::new(&essays)))
}

pub async fn list_requested(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<EssayListResponse>, AppError> {
    list(&state, &user, EssayState::Request).await
}

pub async fn list_proceeding(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<EssayListResponse>, AppError> {
    list(&state, &user, EssayState::Proceed).await
}

pub async fn list_rejected(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<EssayListResponse>, AppError> {
    list(&state, &user, EssayState::Reject).await
}

pub async fn list_completed(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<EssayListResponse>, AppError> {
    list(&state, &user, EssayState::Complete).await
}

/// The state-specific view of one essay. The essay must be in `expected`
/// and the user must take part in it.
async fn view(
    state: &AppState,
    user: &crate::models::User,
    id: EssayId,
    expected: EssayState,
) -> Result<Json<EssayDetailResponse>, AppError> {
    let essay = state.essays.get_essay_by_id(id).await?;
    ensure_participant(&essay, user)?;
    if essay.state() != expected {
        return Err(TransitionError::WrongState {
            action: "view",
            from: essay.state(),
        }
        .into());
    }

    let view = state.essays.project_essay(&essay).await?;
    Ok(Json(view))
}

pub async fn get_requested(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<i64>,
) -> Result<Json<EssayDetailResponse>, AppError> {
    view(&state, &user, EssayId(id), EssayState::Request).await
}

pub async fn get_proceeding(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<i64>,
) -> Result<Json<EssayDetailResponse>, AppError> {
    view(&state, &user, EssayId(id), EssayState::Proceed).await
}

pub async fn get_rejected(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<i64>,
) -> Result<Json<EssayDetailResponse>, AppError> {
    view(&state, &user, EssayId(id), EssayState::Reject).await
}

pub async fn get_completed(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<i64>,
) -> Result<Json<EssayDetailResponse>, AppError> {
    view(&state, &user, EssayId(id), EssayState::Complete).await
}

pub async fn accept_essay(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<i64>,
) -> Result<Json<EssayDetailResponse>, AppError> {
    let essay = state.essays.accept_essay(EssayId(id), &user).await?;
    let view = state.essays.project_essay(&essay).await?;
    Ok(Json(view))
}

pub async fn reject_essay(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<i64>,
    AppJson(body): AppJson<RejectBody>,
) -> Result<Json<EssayDetailResponse>, AppError> {
    let essay = state
        .essays
        .reject_essay(EssayId(id), &user, &body.reject_detail)
        .await?;
    let view = state.essays.project_essay(&essay).await?;
    Ok(Json(view))
}

pub async fn upload_teacher_file(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<i64>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<EssayDetailResponse>), AppError> {
    let mut form = EssayForm::read(multipart).await?;
    let file = form.take_file()?;

    let id = EssayId(id);
    state.essays.upload_teacher_file(id, &user, file).await?;
    let view = state.essays.get_essay_response_with_file_paths(id).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn complete_essay(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<i64>,
) -> Result<Json<EssayDetailResponse>, AppError> {
    let essay = state.essays.complete_essay(EssayId(id), &user).await?;
    let view = state.essays.project_essay(&essay).await?;
    Ok(Json(view))
}

pub async fn review_essay(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<i64>,
    AppJson(body): AppJson<ReviewRequest>,
) -> Result<(StatusCode, Json<EssayDetailResponse>), AppError> {
    let essay = state.essays.review_essay(EssayId(id), &user, body).await?;
    let view = state.essays.project_essay(&essay).await?;
    Ok((StatusCode::CREATED, Json(view)))
}
