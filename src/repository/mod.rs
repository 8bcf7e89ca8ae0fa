//! Persistence ports for users, essays and comments.
//!
//! The services depend on these traits only. `InMemoryRepository` backs tests
//! and database-less runs; `crate::db` provides the PostgreSQL implementation.

mod memory;

pub use memory::InMemoryRepository;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    Comment, CommentId, Essay, EssayId, EssayState, NewComment, NewEssay, Profile, ProfileId,
    User, UserId,
};

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The stored version moved on since the essay was read.
    #[error("essay {0} was modified concurrently")]
    Conflict(EssayId),

    #[error("essay {0} does not exist")]
    MissingEssay(EssayId),

    /// A row violates a domain invariant and cannot be loaded.
    #[error("stored data is inconsistent: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn find_profile(&self, id: ProfileId) -> Result<Option<Profile>, RepositoryError>;
}

#[async_trait]
pub trait EssayRepository: Send + Sync {
    /// Inserts a new essay in REQUEST state with version 0.
    async fn insert(&self, essay: NewEssay) -> Result<Essay, RepositoryError>;

    async fn find(&self, id: EssayId) -> Result<Option<Essay>, RepositoryError>;

    /// Essays the user takes part in, as student or teacher, in the given
    /// state. Ordered by id.
    async fn find_by_participant(
        &self,
        user_id: UserId,
        state: EssayState,
    ) -> Result<Vec<Essay>, RepositoryError>;

    /// Persists the essay's lifecycle if the stored version still equals
    /// `essay.version`, and returns it with the version bumped.
    async fn update(&self, essay: &Essay) -> Result<Essay, RepositoryError>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn insert(&self, comment: NewComment) -> Result<Comment, RepositoryError>;

    async fn find(&self, id: CommentId) -> Result<Option<Comment>, RepositoryError>;

    /// Comments on an essay in insertion order.
    async fn list_for_essay(&self, essay_id: EssayId) -> Result<Vec<Comment>, RepositoryError>;

    /// Returns whether a comment was removed.
    async fn delete(&self, id: CommentId) -> Result<bool, RepositoryError>;
}
