use std::sync::Arc;

use crate::config::Config;
use crate::repository::{CommentRepository, EssayRepository, UserRepository};
use crate::service::{CommentService, EssayService};
use crate::storage::FileStorage;

#[derive(Clone)]
pub struct AppState {
    pub essays: EssayService,
    pub comments: CommentService,
    pub users: Arc<dyn UserRepository>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires both services to one store that backs all three repositories.
    pub fn new<R>(store: Arc<R>, files: Arc<dyn FileStorage>, config: Arc<Config>) -> Self
    where
        R: UserRepository + EssayRepository + CommentRepository + 'static,
    {
        Self {
            essays: EssayService::new(store.clone(), store.clone(), store.clone(), files),
            comments: CommentService::new(store.clone(), store.clone()),
            users: store,
            config,
        }
    }
}
