//! Domain entities for the essay marketplace.
//!
//! These types carry no persistence or HTTP concerns. Repositories hydrate
//! them from storage and `response` projects them into DTOs.

mod comment;
mod essay;
mod lifecycle;
mod user;

pub use comment::{Comment, NewComment};
pub use essay::{Essay, EssayState, NewEssay, ReviewState};
pub use lifecycle::{Lifecycle, Review, TransitionError};
pub use user::{Profile, Role, User};

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

id_newtype!(
    /// Primary key of a user.
    UserId
);
id_newtype!(
    /// Primary key of a teacher profile.
    ProfileId
);
id_newtype!(
    /// Primary key of an essay.
    EssayId
);
id_newtype!(
    /// Primary key of a comment.
    CommentId
);

/// Opaque handle to a file held by the storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileKey(pub String);

impl FileKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for FileKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for FileKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
