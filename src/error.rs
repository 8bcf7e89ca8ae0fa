//! Error codes and the domain error type.
//!
//! Every failure a handler can return is an `AppError`. Each variant maps to
//! one `ErrorCode`, and the code alone decides the HTTP status and the public
//! message.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::models::{EssayId, TransitionError};
use crate::repository::RepositoryError;
use crate::storage::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    EssayNotFound,
    ProfileNotFound,
    CommentNotFound,
    InvalidEssayState,
    InvalidInput,
    FileUploadFailed,
    FileUnavailable,
    Unauthenticated,
    StudentOnly,
    NotAssignedTeacher,
    NotEssayOwner,
    NotEssayParticipant,
    NotCommentAuthor,
    ConcurrentModification,
    InternalError,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::EssayNotFound | ErrorCode::ProfileNotFound | ErrorCode::CommentNotFound => {
                StatusCode::NOT_FOUND
            }
            ErrorCode::InvalidEssayState | ErrorCode::ConcurrentModification => {
                StatusCode::CONFLICT
            }
            ErrorCode::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorCode::FileUploadFailed | ErrorCode::FileUnavailable => StatusCode::BAD_GATEWAY,
            ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorCode::StudentOnly
            | ErrorCode::NotAssignedTeacher
            | ErrorCode::NotEssayOwner
            | ErrorCode::NotEssayParticipant
            | ErrorCode::NotCommentAuthor => StatusCode::FORBIDDEN,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::EssayNotFound => "essay not found",
            ErrorCode::ProfileNotFound => "teacher profile not found",
            ErrorCode::CommentNotFound => "comment not found",
            ErrorCode::InvalidEssayState => "essay is not in a state that allows this action",
            ErrorCode::InvalidInput => "request contains invalid fields",
            ErrorCode::FileUploadFailed => "file could not be stored",
            ErrorCode::FileUnavailable => "stored file could not be located",
            ErrorCode::Unauthenticated => "request is not associated with a known user",
            ErrorCode::StudentOnly => "only students can request corrections",
            ErrorCode::NotAssignedTeacher => "only the assigned teacher can do this",
            ErrorCode::NotEssayOwner => "only the student who requested the essay can do this",
            ErrorCode::NotEssayParticipant => "user does not take part in this essay",
            ErrorCode::NotCommentAuthor => "only the author can delete a comment",
            ErrorCode::ConcurrentModification => "essay was changed by another request, retry",
            ErrorCode::InternalError => "internal server error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code} (id {id})")]
    NotFound { code: ErrorCode, id: i64 },

    #[error(transparent)]
    InvalidState(#[from] TransitionError),

    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("file upload failed: {0}")]
    Upload(#[source] StorageError),

    #[error("file lookup failed: {0}")]
    FileUnavailable(#[source] StorageError),

    #[error("{0}")]
    Forbidden(ErrorCode),

    #[error("missing or unknown user")]
    Unauthenticated,

    #[error("essay {0} was modified concurrently")]
    Conflict(EssayId),

    #[error(transparent)]
    Repository(RepositoryError),
}

impl AppError {
    pub fn not_found(code: ErrorCode, id: impl Into<i64>) -> Self {
        AppError::NotFound {
            code,
            id: id.into(),
        }
    }

    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        AppError::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::NotFound { code, .. } => *code,
            AppError::InvalidState(_) => ErrorCode::InvalidEssayState,
            AppError::Validation { .. } => ErrorCode::InvalidInput,
            AppError::Upload(_) => ErrorCode::FileUploadFailed,
            AppError::FileUnavailable(_) => ErrorCode::FileUnavailable,
            AppError::Forbidden(code) => *code,
            AppError::Unauthenticated => ErrorCode::Unauthenticated,
            AppError::Conflict(_) => ErrorCode::ConcurrentModification,
            AppError::Repository(_) => ErrorCode::InternalError,
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(id) => AppError::Conflict(id),
            RepositoryError::MissingEssay(id) => AppError::not_found(ErrorCode::EssayNotFound, id.0),
            other => AppError::Repository(other),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::validation("body", rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::validation("path", rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: ErrorCode,
    message: &'static str,
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let detail = if code == ErrorCode::InternalError {
            tracing::error!("Request failed: {}", self);
            code.message().to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            code,
            message: code.message(),
            detail,
        };
        (code.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EssayState;

    #[test]
    fn transition_errors_map_to_invalid_state() {
        let err: AppError = TransitionError::WrongState {
            action: "accept",
            from: EssayState::Reject,
        }
        .into();
        assert_eq!(err.code(), ErrorCode::InvalidEssayState);
        assert_eq!(err.code().status(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "cannot accept an essay in REJECT state");
    }

    #[test]
    fn repository_conflict_becomes_concurrent_modification() {
        let err: AppError = RepositoryError::Conflict(EssayId(7)).into();
        assert!(matches!(err, AppError::Conflict(EssayId(7))));
        assert_eq!(err.code(), ErrorCode::ConcurrentModification);
    }

    #[test]
    fn corrupt_rows_are_internal_errors() {
        let err: AppError = RepositoryError::Corrupt("bad state".to_string()).into();
        assert_eq!(err.code(), ErrorCode::InternalError);
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn not_found_names_the_missing_thing() {
        let err = AppError::not_found(ErrorCode::ProfileNotFound, 3);
        assert_eq!(err.to_string(), "teacher profile not found (id 3)");
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn error_codes_serialize_as_constants() {
        assert_eq!(
            serde_json::to_string(&ErrorCode::NotAssignedTeacher).unwrap(),
            "\"NOT_ASSIGNED_TEACHER\""
        );
    }
}
