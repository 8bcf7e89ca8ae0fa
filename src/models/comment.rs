use chrono::{DateTime, Utc};

use super::{CommentId, EssayId, User};

/// A message on an essay from either participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: CommentId,
    pub essay_id: EssayId,
    pub author: User,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub essay_id: EssayId,
    pub author: User,
    pub detail: String,
}
