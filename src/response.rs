//! JSON views of essays.
//!
//! Projection is pure: it takes an essay plus already resolved file URLs and
//! comments and picks the shape that matches the essay's state.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Comment, CommentId, Essay, EssayId, EssayState, Lifecycle, ReviewState, User};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherResponse {
    pub name: String,
    pub email: String,
    pub catch_phrase: Option<String>,
}

impl From<&User> for TeacherResponse {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            catch_phrase: user.catch_phrase.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserResponse {
    pub name: String,
    pub email: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub comment_id: CommentId,
    pub user: UserResponse,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Comment> for CommentResponse {
    fn from(comment: &Comment) -> Self {
        Self {
            comment_id: comment.id,
            user: UserResponse::from(&comment.author),
            detail: comment.detail.clone(),
            created_at: comment.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewResponse {
    pub score: u8,
    pub detail: String,
}

/// Fields every single-essay view shares.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EssayCore {
    pub id: EssayId,
    pub univ: String,
    pub exam_year: String,
    pub e_type: String,
    pub inquiry: String,
    pub essay_state: EssayState,
    pub student_file_path: String,
    pub teacher: TeacherResponse,
    pub student: UserResponse,
    pub created_at: DateTime<Utc>,
}

impl EssayCore {
    fn new(essay: &Essay, student_file_path: String) -> Self {
        Self {
            id: essay.id,
            univ: essay.univ.clone(),
            exam_year: essay.exam_year.clone(),
            e_type: essay.e_type.clone(),
            inquiry: essay.inquiry.clone(),
            essay_state: essay.state(),
            student_file_path,
            teacher: TeacherResponse::from(&essay.teacher),
            student: UserResponse::from(&essay.student),
            created_at: essay.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestEssayResponse {
    #[serde(flatten)]
    pub essay: EssayCore,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectEssayResponse {
    #[serde(flatten)]
    pub essay: EssayCore,
    pub reject_detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProceedEssayResponse {
    #[serde(flatten)]
    pub essay: EssayCore,
    pub teacher_file_path: Option<String>,
    pub comments: Vec<CommentResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteEssayResponse {
    #[serde(flatten)]
    pub essay: EssayCore,
    pub teacher_file_path: Option<String>,
    pub comments: Vec<CommentResponse>,
    pub review_state: ReviewState,
    pub review: Option<ReviewResponse>,
}

/// One of the four state-specific views.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EssayDetailResponse {
    Request(RequestEssayResponse),
    Reject(RejectEssayResponse),
    Proceed(ProceedEssayResponse),
    Complete(CompleteEssayResponse),
}

impl EssayDetailResponse {
    /// Builds the view for the essay's current state.
    ///
    /// REQUEST and REJECT views ignore the teacher file and the comments.
    pub fn project(
        essay: &Essay,
        student_file_path: String,
        teacher_file_path: Option<String>,
        comments: &[Comment],
    ) -> Self {
        let core = EssayCore::new(essay, student_file_path);
        let comment_views =
            || -> Vec<CommentResponse> { comments.iter().map(CommentResponse::from).collect() };

        match essay.lifecycle() {
            Lifecycle::Requested => Self::Request(RequestEssayResponse { essay: core }),
            Lifecycle::Rejected { detail } => Self::Reject(RejectEssayResponse {
                essay: core,
                reject_detail: detail.clone(),
            }),
            Lifecycle::Proceeding { .. } => Self::Proceed(ProceedEssayResponse {
                essay: core,
                teacher_file_path,
                comments: comment_views(),
            }),
            Lifecycle::Completed { review, .. } => Self::Complete(CompleteEssayResponse {
                essay: core,
                teacher_file_path,
                comments: comment_views(),
                review_state: essay.review_state(),
                review: review.as_ref().map(|r| ReviewResponse {
                    score: r.score,
                    detail: r.detail.clone(),
                }),
            }),
        }
    }

    pub fn state(&self) -> EssayState {
        self.core().essay_state
    }

    pub fn core(&self) -> &EssayCore {
        match self {
            Self::Request(r) => &r.essay,
            Self::Reject(r) => &r.essay,
            Self::Proceed(r) => &r.essay,
            Self::Complete(r) => &r.essay,
        }
    }
}

/// Row in an essay list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EssaySummaryResponse {
    pub id: EssayId,
    pub univ: String,
    pub exam_year: String,
    pub e_type: String,
    pub essay_state: EssayState,
    pub review_state: ReviewState,
    pub teacher: TeacherResponse,
    pub student: UserResponse,
    pub created_at: DateTime<Utc>,
}

impl From<&Essay> for EssaySummaryResponse {
    fn from(essay: &Essay) -> Self {
        Self {
            id: essay.id,
            univ: essay.univ.clone(),
            exam_year: essay.exam_year.clone(),
            e_type: essay.e_type.clone(),
            essay_state: essay.state(),
            review_state: essay.review_state(),
            teacher: TeacherResponse::from(&essay.teacher),
            student: UserResponse::from(&essay.student),
            created_at: essay.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EssayListResponse {
    pub essays: Vec<EssaySummaryResponse>,
}

impl EssayListResponse {
    pub fn new(essays: &[Essay]) -> Self {
        Self {
            essays: essays.iter().map(EssaySummaryResponse::from).collect(),
        }
    }
}
