use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::{exam_year, required_text};
use crate::error::{AppError, ErrorCode};
use crate::models::{
    Essay, EssayId, EssayState, FileKey, NewEssay, ProfileId, Review, TransitionError, User,
};
use crate::repository::{CommentRepository, EssayRepository, UserRepository};
use crate::response::EssayDetailResponse;
use crate::storage::{validate_upload, FileStorage, UploadedFile};

const MAX_UNIV_CHARS: usize = 50;
const MAX_E_TYPE_CHARS: usize = 20;
const MAX_INQUIRY_CHARS: usize = 2000;
const MAX_REJECT_DETAIL_CHARS: usize = 500;
const MAX_REVIEW_DETAIL_CHARS: usize = 1000;

/// Form fields of a correction request, with the student's file.
#[derive(Debug, Clone)]
pub struct CreateEssayRequest {
    pub univ: String,
    pub exam_year: String,
    pub inquiry: String,
    pub e_type: String,
    pub essay_file: UploadedFile,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRequest {
    pub score: u8,
    pub detail: String,
}

/// Drives essays through their lifecycle and assembles their views.
#[derive(Clone)]
pub struct EssayService {
    essays: Arc<dyn EssayRepository>,
    users: Arc<dyn UserRepository>,
    comments: Arc<dyn CommentRepository>,
    files: Arc<dyn FileStorage>,
}

impl EssayService {
    pub fn new(
        essays: Arc<dyn EssayRepository>,
        users: Arc<dyn UserRepository>,
        comments: Arc<dyn CommentRepository>,
        files: Arc<dyn FileStorage>,
    ) -> Self {
        Self {
            essays,
            users,
            comments,
            files,
        }
    }

    /// Stores the student's file and opens a REQUEST essay against the
    /// teacher behind `profile_id`.
    pub async fn create_essay(
        &self,
        profile_id: ProfileId,
        requester: &User,
        request: CreateEssayRequest,
    ) -> Result<Essay, AppError> {
        if !requester.is_student() {
            return Err(AppError::Forbidden(ErrorCode::StudentOnly));
        }
        let profile = self
            .users
            .find_profile(profile_id)
            .await?
            .ok_or_else(|| AppError::not_found(ErrorCode::ProfileNotFound, profile_id.0))?;

        let univ = required_text("univ", &request.univ, MAX_UNIV_CHARS)?;
        let exam_year = exam_year(&request.exam_year)?;
        let e_type = required_text("eType", &request.e_type, MAX_E_TYPE_CHARS)?;
        let inquiry = request.inquiry.trim().to_string();
        if inquiry.chars().count() > MAX_INQUIRY_CHARS {
            return Err(AppError::validation(
                "inquiry",
                format!("must be at most {MAX_INQUIRY_CHARS} characters"),
            ));
        }
        validate_upload(&request.essay_file)
            .map_err(|reason| AppError::validation("essayFile", reason))?;

        let stored = self
            .files
            .upload(request.essay_file)
            .await
            .map_err(AppError::Upload)?;

        let draft = NewEssay {
            student: requester.clone(),
            teacher: profile.teacher,
            univ,
            exam_year,
            e_type,
            inquiry,
            student_file: stored.key.clone(),
        };
        match self.essays.insert(draft).await {
            Ok(essay) => {
                info!(
                    "Essay {} requested by user {} for teacher {}",
                    essay.id, essay.student.id, essay.teacher.id
                );
                Ok(essay)
            }
            Err(e) => {
                self.discard_file(&stored.key).await;
                Err(e.into())
            }
        }
    }

    pub async fn get_essay_by_id(&self, essay_id: EssayId) -> Result<Essay, AppError> {
        self.essays
            .find(essay_id)
            .await?
            .ok_or_else(|| AppError::not_found(ErrorCode::EssayNotFound, essay_id.0))
    }

    /// Essays in `state` where `user` is the student or the teacher.
    pub async fn get_essays_by_user(
        &self,
        user: &User,
        state: EssayState,
    ) -> Result<Vec<Essay>, AppError> {
        Ok(self.essays.find_by_participant(user.id, state).await?)
    }

    /// REQUEST -> PROCEED
    pub async fn accept_essay(&self, essay_id: EssayId, requester: &User) -> Result<Essay, AppError> {
        let essay = self
            .transition(essay_id, requester, |essay| essay.accept())
            .await?;
        info!("Essay {} accepted by teacher {}", essay.id, requester.id);
        Ok(essay)
    }

    /// REQUEST -> REJECT
    pub async fn reject_essay(
        &self,
        essay_id: EssayId,
        requester: &User,
        detail: &str,
    ) -> Result<Essay, AppError> {
        let detail = required_text("rejectDetail", detail, MAX_REJECT_DETAIL_CHARS)?;
        let essay = self
            .transition(essay_id, requester, move |essay| essay.reject(detail))
            .await?;
        info!("Essay {} rejected by teacher {}", essay.id, requester.id);
        Ok(essay)
    }

    /// PROCEED -> COMPLETE. The teacher file must already be uploaded.
    pub async fn complete_essay(
        &self,
        essay_id: EssayId,
        requester: &User,
    ) -> Result<Essay, AppError> {
        let essay = self
            .transition(essay_id, requester, |essay| essay.complete())
            .await?;
        info!("Essay {} completed by teacher {}", essay.id, requester.id);
        Ok(essay)
    }

    /// Uploads the teacher's annotated file for a PROCEED essay and returns
    /// its URL. A previously uploaded teacher file is replaced.
    pub async fn upload_teacher_file(
        &self,
        essay_id: EssayId,
        requester: &User,
        file: UploadedFile,
    ) -> Result<String, AppError> {
        let mut essay = self.get_essay_by_id(essay_id).await?;
        ensure_assigned_teacher(&essay, requester)?;
        if essay.state() != EssayState::Proceed {
            return Err(TransitionError::WrongState {
                action: "upload a teacher file to",
                from: essay.state(),
            }
            .into());
        }
        validate_upload(&file).map_err(|reason| AppError::validation("essayFile", reason))?;

        let stored = self.files.upload(file).await.map_err(AppError::Upload)?;
        let replaced = match essay.attach_teacher_file(stored.key.clone()) {
            Ok(replaced) => replaced,
            Err(e) => {
                self.discard_file(&stored.key).await;
                return Err(e.into());
            }
        };
        if let Err(e) = self.essays.update(&essay).await {
            self.discard_file(&stored.key).await;
            return Err(e.into());
        }
        if let Some(old) = replaced {
            self.discard_file(&old).await;
        }

        info!("Teacher file {} attached to essay {}", stored.key, essay_id);
        Ok(stored.url)
    }

    /// Records the student's review of a COMPLETE essay.
    pub async fn review_essay(
        &self,
        essay_id: EssayId,
        requester: &User,
        request: ReviewRequest,
    ) -> Result<Essay, AppError> {
        let mut essay = self.get_essay_by_id(essay_id).await?;
        if essay.student.id != requester.id {
            return Err(AppError::Forbidden(ErrorCode::NotEssayOwner));
        }
        if !(1..=5).contains(&request.score) {
            return Err(AppError::validation("score", "must be between 1 and 5"));
        }
        let detail = required_text("detail", &request.detail, MAX_REVIEW_DETAIL_CHARS)?;

        essay.add_review(Review {
            score: request.score,
            detail,
        })?;
        let essay = self.essays.update(&essay).await?;
        info!("Essay {} reviewed by student {}", essay.id, requester.id);
        Ok(essay)
    }

    /// View of a REQUEST or REJECT essay, which only exposes the student file.
    pub async fn get_essay_response_with_student_file(
        &self,
        essay_id: EssayId,
    ) -> Result<EssayDetailResponse, AppError> {
        let essay = self.get_essay_by_id(essay_id).await?;
        if !matches!(essay.state(), EssayState::Request | EssayState::Reject) {
            return Err(TransitionError::WrongState {
                action: "view the request of",
                from: essay.state(),
            }
            .into());
        }
        self.project_essay(&essay).await
    }

    /// View of a PROCEED or COMPLETE essay with both files and the comments.
    pub async fn get_essay_response_with_file_paths(
        &self,
        essay_id: EssayId,
    ) -> Result<EssayDetailResponse, AppError> {
        let essay = self.get_essay_by_id(essay_id).await?;
        if !matches!(essay.state(), EssayState::Proceed | EssayState::Complete) {
            return Err(TransitionError::WrongState {
                action: "view the correction of",
                from: essay.state(),
            }
            .into());
        }
        self.project_essay(&essay).await
    }

    /// Builds the view matching the state of an already loaded essay.
    /// REQUEST and REJECT views skip the teacher file and the comments.
    pub async fn project_essay(&self, essay: &Essay) -> Result<EssayDetailResponse, AppError> {
        let student_file_path = self
            .files
            .resolve(&essay.student_file)
            .await
            .map_err(AppError::FileUnavailable)?;

        if matches!(essay.state(), EssayState::Request | EssayState::Reject) {
            return Ok(EssayDetailResponse::project(
                essay,
                student_file_path,
                None,
                &[],
            ));
        }

        let teacher_file_path = match essay.teacher_file() {
            Some(key) => Some(
                self.files
                    .resolve(key)
                    .await
                    .map_err(AppError::FileUnavailable)?,
            ),
            None => None,
        };
        let comments = self.comments.list_for_essay(essay.id).await?;

        Ok(EssayDetailResponse::project(
            essay,
            student_file_path,
            teacher_file_path,
            &comments,
        ))
    }

    /// Loads, checks the teacher, applies `apply` and saves with a version
    /// check. A concurrent change surfaces as `AppError::Conflict`.
    async fn transition<F>(
        &self,
        essay_id: EssayId,
        requester: &User,
        apply: F,
    ) -> Result<Essay, AppError>
    where
        F: FnOnce(&mut Essay) -> Result<(), TransitionError> + Send,
    {
        let mut essay = self.get_essay_by_id(essay_id).await?;
        ensure_assigned_teacher(&essay, requester)?;
        apply(&mut essay)?;
        Ok(self.essays.update(&essay).await?)
    }

    async fn discard_file(&self, key: &FileKey) {
        if let Err(e) = self.files.delete(key).await {
            warn!("Failed to delete orphaned file {}: {}", key, e);
        }
    }
}

fn ensure_assigned_teacher(essay: &Essay, user: &User) -> Result<(), AppError> {
    if essay.teacher.id == user.id {
        Ok(())
    } else {
        Err(AppError::Forbidden(ErrorCode::NotAssignedTeacher))
    }
}
