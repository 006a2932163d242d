use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use tracing::debug;

use crate::{error::AppError, state::AppState};

/// The `:user_id` path segment. Anything that is not an integer cannot name
/// a row, so it is answered like a missing user.
#[derive(Debug)]
pub struct UserIdPath(pub i64);

#[async_trait]
impl FromRequestParts<AppState> for UserIdPath {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path(user_id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                debug!(error = %rejection, "user id is not an integer");
                AppError::NotFound
            })?;
        Ok(UserIdPath(user_id))
    }
}
