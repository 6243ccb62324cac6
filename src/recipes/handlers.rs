use std::collections::HashMap;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::extractors::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

use super::dto::{
    parse_id_list, validate_price, ListParams, RecipeDetails, RecipeImageResponse, RecipeListItem,
    RecipePatchRequest, RecipeWriteRequest,
};
use super::images;
use super::repo::{self, NewRecipe, Recipe, RecipeFilter, RecipePatch};

const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route(
            "/recipes/:id",
            get(get_recipe)
                .put(put_recipe)
                .patch(patch_recipe)
                .delete(delete_recipe),
        )
        .route(
            "/recipes/:id/upload-image",
            post(upload_image).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES)),
        )
        .route("/recipes/:id/image", get(get_image))
}

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<RecipeListItem>>> {
    let filter = RecipeFilter {
        tag_ids: params
            .tags
            .as_deref()
            .map(|raw| parse_id_list(raw, "tags"))
            .transpose()?,
        ingredient_ids: params
            .ingredients
            .as_deref()
            .map(|raw| parse_id_list(raw, "ingredients"))
            .transpose()?,
    };

    let recipes = repo::list_by_user(&state.db, user_id, &filter).await?;
    let ids: Vec<Uuid> = recipes.iter().map(|r| r.id).collect();

    let mut tags_by_recipe: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for (recipe_id, tag_id) in repo::tag_links(&state.db, &ids).await? {
        tags_by_recipe.entry(recipe_id).or_default().push(tag_id);
    }
    let mut ingredients_by_recipe: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for (recipe_id, ingredient_id) in repo::ingredient_links(&state.db, &ids).await? {
        ingredients_by_recipe
            .entry(recipe_id)
            .or_default()
            .push(ingredient_id);
    }

    let items = recipes
        .into_iter()
        .map(|r| {
            let tags = tags_by_recipe.remove(&r.id).unwrap_or_default();
            let ingredients = ingredients_by_recipe.remove(&r.id).unwrap_or_default();
            RecipeListItem::from_recipe(r, tags, ingredients)
        })
        .collect();
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<RecipeDetails>> {
    let recipe = fetch_owned(&state, user_id, id).await?;
    Ok(Json(assemble_details(&state, recipe).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<RecipeWriteRequest>,
) -> ApiResult<(StatusCode, Json<RecipeDetails>)> {
    let title = validated_title(&payload.title)?;
    validate_price(payload.price)?;

    let recipe = repo::create(
        &state.db,
        user_id,
        NewRecipe {
            title,
            time_minutes: payload.time_minutes,
            price: payload.price,
            link: payload.link.as_deref(),
            tag_ids: &payload.tags,
            ingredient_ids: &payload.ingredients,
        },
    )
    .await?;

    info!(recipe_id = %recipe.id, %user_id, "recipe created");
    let details = assemble_details(&state, recipe).await?;
    Ok((StatusCode::CREATED, Json(details)))
}

/// Full replace: omitted relations become empty, omitted link becomes null.
#[instrument(skip(state, payload))]
pub async fn put_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecipeWriteRequest>,
) -> ApiResult<Json<RecipeDetails>> {
    let title = validated_title(&payload.title)?;
    validate_price(payload.price)?;

    let patch = RecipePatch {
        title: Some(title.to_string()),
        time_minutes: Some(payload.time_minutes),
        price: Some(payload.price),
        link: Some(payload.link),
        tag_ids: Some(payload.tags),
        ingredient_ids: Some(payload.ingredients),
    };
    let recipe = repo::update(&state.db, user_id, id, patch)
        .await?
        .ok_or(ApiError::NotFound("Recipe"))?;

    info!(recipe_id = %recipe.id, "recipe replaced");
    Ok(Json(assemble_details(&state, recipe).await?))
}

/// Partial update: only supplied fields change.
#[instrument(skip(state, payload))]
pub async fn patch_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecipePatchRequest>,
) -> ApiResult<Json<RecipeDetails>> {
    let title = payload
        .title
        .as_deref()
        .map(validated_title)
        .transpose()?
        .map(str::to_string);
    if let Some(price) = payload.price {
        validate_price(price)?;
    }

    let patch = RecipePatch {
        title,
        time_minutes: payload.time_minutes,
        price: payload.price,
        link: payload.link.map(Some),
        tag_ids: payload.tags,
        ingredient_ids: payload.ingredients,
    };
    let recipe = repo::update(&state.db, user_id, id, patch)
        .await?
        .ok_or(ApiError::NotFound("Recipe"))?;

    info!(recipe_id = %recipe.id, "recipe updated");
    Ok(Json(assemble_details(&state, recipe).await?))
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let recipe = repo::delete_for_user(&state.db, user_id, id)
        .await?
        .ok_or(ApiError::NotFound("Recipe"))?;

    if let Some(key) = &recipe.image_key {
        if let Err(e) = state.storage.delete_object(key).await {
            tracing::warn!(error = %e, key = %key, "failed to delete image of removed recipe");
        }
    }

    info!(recipe_id = %recipe.id, "recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, multipart))]
pub async fn upload_image(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<Json<RecipeImageResponse>> {
    let recipe = fetch_owned(&state, user_id, id).await?;

    let mut upload: Option<(Bytes, String)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation("image", e.to_string()))?
    {
        if field.name() == Some("image") {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::validation("image", e.to_string()))?;
            upload = Some((data, content_type));
        }
    }
    let (data, content_type) =
        upload.ok_or_else(|| ApiError::validation("image", "No file was submitted"))?;

    let key = images::store_recipe_image(&state, &recipe, data, &content_type).await?;
    Ok(Json(RecipeImageResponse {
        id: recipe.id,
        image: key,
    }))
}

/// 302 to a presigned URL for the stored image.
#[instrument(skip(state))]
pub async fn get_image(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Redirect> {
    let recipe = fetch_owned(&state, user_id, id).await?;
    let key = recipe.image_key.as_deref().ok_or(ApiError::NotFound("Image"))?;
    let url = images::presign_image(&state, key).await?;
    Ok(Redirect::temporary(&url))
}

/// Another user's recipe is reported as absent, not forbidden.
async fn fetch_owned(state: &AppState, user_id: Uuid, id: Uuid) -> Result<Recipe, ApiError> {
    repo::get_for_user(&state.db, user_id, id)
        .await?
        .ok_or(ApiError::NotFound("Recipe"))
}

async fn assemble_details(state: &AppState, recipe: Recipe) -> Result<RecipeDetails, ApiError> {
    let tags = repo::tags_of(&state.db, recipe.id).await?;
    let ingredients = repo::ingredients_of(&state.db, recipe.id).await?;
    Ok(RecipeDetails::from_recipe(recipe, tags, ingredients))
}

fn validated_title(raw: &str) -> Result<&str, ApiError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ApiError::validation("title", "This field may not be blank"));
    }
    Ok(title)
}
