use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;
use uuid::Uuid;

use crate::auth::repo::AuthToken;
use crate::error::ApiError;
use crate::state::AppState;

/// Resolves the bearer token against the token store and yields the owner's
/// user ID. Inactive users are rejected like unknown tokens.
#[derive(Debug)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let key = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or(ApiError::Unauthorized)?;

        match AuthToken::resolve_key(&state.db, key).await? {
            Some((user_id, true)) => Ok(AuthUser(user_id)),
            Some((user_id, false)) => {
                warn!(%user_id, "token for inactive user");
                Err(ApiError::Unauthorized)
            }
            None => {
                warn!("unknown token");
                Err(ApiError::Unauthorized)
            }
        }
    }
}
