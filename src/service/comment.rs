use std::sync::Arc;
use tracing::info;

use super::{ensure_participant, required_text};
use crate::error::{AppError, ErrorCode};
use crate::models::{Comment, CommentId, Essay, EssayId, NewComment, User};
use crate::repository::{CommentRepository, EssayRepository};

const MAX_COMMENT_CHARS: usize = 1000;

/// Comments left by the student and the teacher of an essay.
#[derive(Clone)]
pub struct CommentService {
    essays: Arc<dyn EssayRepository>,
    comments: Arc<dyn CommentRepository>,
}

impl CommentService {
    pub fn new(essays: Arc<dyn EssayRepository>, comments: Arc<dyn CommentRepository>) -> Self {
        Self { essays, comments }
    }

    pub async fn create_comment(
        &self,
        essay_id: EssayId,
        author: &User,
        detail: &str,
    ) -> Result<Comment, AppError> {
        let essay = self.load_essay(essay_id).await?;
        ensure_participant(&essay, author)?;
        let detail = required_text("detail", detail, MAX_COMMENT_CHARS)?;

        let comment = self
            .comments
            .insert(NewComment {
                essay_id,
                author: author.clone(),
                detail,
            })
            .await?;
        info!("Comment {} added to essay {} by user {}", comment.id, essay_id, author.id);
        Ok(comment)
    }

    /// Deletes a comment of `essay_id`. Only its author may do so.
    pub async fn delete_comment(
        &self,
        essay_id: EssayId,
        comment_id: CommentId,
        requester: &User,
    ) -> Result<(), AppError> {
        let comment = self
            .comments
            .find(comment_id)
            .await?
            .filter(|c| c.essay_id == essay_id)
            .ok_or_else(|| AppError::not_found(ErrorCode::CommentNotFound, comment_id.0))?;
        if comment.author.id != requester.id {
            return Err(AppError::Forbidden(ErrorCode::NotCommentAuthor));
        }

        if !self.comments.delete(comment_id).await? {
            return Err(AppError::not_found(ErrorCode::CommentNotFound, comment_id.0));
        }
        info!("Comment {} deleted from essay {}", comment_id, essay_id);
        Ok(())
    }

    /// Comments of an essay, oldest first.
    pub async fn get_comments(&self, essay_id: EssayId) -> Result<Vec<Comment>, AppError> {
        self.load_essay(essay_id).await?;
        Ok(self.comments.list_for_essay(essay_id).await?)
    }

    async fn load_essay(&self, essay_id: EssayId) -> Result<Essay, AppError> {
        self.essays
            .find(essay_id)
            .await?
            .ok_or_else(|| AppError::not_found(ErrorCode::EssayNotFound, essay_id.0))
    }
}
