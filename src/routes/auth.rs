use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

use crate::error::AppError;
use crate::models::{User, UserId};
use crate::state::AppState;

/// Header carrying the id of the acting user, set by the upstream gateway.
pub const USER_HEADER: &str = "x-user-id";

/// The user making the request. Rejects with 401 when the header is missing,
/// malformed, or names nobody.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<i64>().ok())
            .ok_or(AppError::Unauthenticated)?;

        let user = state
            .users
            .find_user(UserId(id))
            .await?
            .ok_or(AppError::Unauthenticated)?;
        Ok(CurrentUser(user))
    }
}
