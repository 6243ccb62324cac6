use axum::{extract::State, http::StatusCode, Json};
use tracing::{info, instrument};

use crate::attrs::{dto::CreateAttrRequest, repo};
use crate::auth::extractors::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// List the caller's records, name descending.
#[instrument(skip(state), fields(table = A::TABLE))]
pub async fn list_attrs<A: repo::OwnedAttr>(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<Vec<A>>> {
    let items = repo::list_for_user::<A>(&state.db, user_id).await?;
    Ok(Json(items))
}

/// Create a record owned by the caller.
#[instrument(skip(state, payload), fields(table = A::TABLE))]
pub async fn create_attr<A: repo::OwnedAttr>(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateAttrRequest>,
) -> ApiResult<(StatusCode, Json<A>)> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("name", "This field may not be blank"));
    }
    let item = repo::create_for_user::<A>(&state.db, user_id, name).await?;
    info!(%user_id, table = A::TABLE, "attribute created");
    Ok((StatusCode::CREATED, Json(item)))
}
