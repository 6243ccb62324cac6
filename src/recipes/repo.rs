use serde::{Deserialize, Serialize};
use sqlx::types::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::attrs::{Ingredient, Tag};
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
    pub image_key: Option<String>,
    pub created_at: OffsetDateTime,
}

const RECIPE_COLUMNS: &str = "id, user_id, title, time_minutes, price, link, image_key, created_at";

#[derive(Debug, Default)]
pub struct RecipeFilter {
    pub tag_ids: Option<Vec<Uuid>>,
    pub ingredient_ids: Option<Vec<Uuid>>,
}

pub struct NewRecipe<'a> {
    pub title: &'a str,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<&'a str>,
    pub tag_ids: &'a [Uuid],
    pub ingredient_ids: &'a [Uuid],
}

/// Field set for an update. Outer `None` leaves the field untouched;
/// `link: Some(None)` clears it.
#[derive(Debug, Default)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<Option<String>>,
    pub tag_ids: Option<Vec<Uuid>>,
    pub ingredient_ids: Option<Vec<Uuid>>,
}

/// Recipes of one user, newest first, optionally narrowed to those having any
/// of the given tags and any of the given ingredients.
pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    filter: &RecipeFilter,
) -> Result<Vec<Recipe>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {RECIPE_COLUMNS}
        FROM recipes r
        WHERE r.user_id = $1
          AND ($2::uuid[] IS NULL OR EXISTS (
                SELECT 1 FROM recipe_tags rt
                WHERE rt.recipe_id = r.id AND rt.tag_id = ANY($2)))
          AND ($3::uuid[] IS NULL OR EXISTS (
                SELECT 1 FROM recipe_ingredients ri
                WHERE ri.recipe_id = r.id AND ri.ingredient_id = ANY($3)))
        ORDER BY r.created_at DESC
        "#
    );
    sqlx::query_as::<_, Recipe>(&sql)
        .bind(user_id)
        .bind(filter.tag_ids.clone())
        .bind(filter.ingredient_ids.clone())
        .fetch_all(db)
        .await
}

pub async fn get_for_user(
    db: &PgPool,
    user_id: Uuid,
    recipe_id: Uuid,
) -> Result<Option<Recipe>, sqlx::Error> {
    let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1 AND user_id = $2");
    sqlx::query_as::<_, Recipe>(&sql)
        .bind(recipe_id)
        .bind(user_id)
        .fetch_optional(db)
        .await
}

/// (recipe_id, tag_id) pairs for a set of recipes, for assembling list items.
pub async fn tag_links(db: &PgPool, recipe_ids: &[Uuid]) -> Result<Vec<(Uuid, Uuid)>, sqlx::Error> {
    sqlx::query_as::<_, (Uuid, Uuid)>(
        "SELECT recipe_id, tag_id FROM recipe_tags WHERE recipe_id = ANY($1)",
    )
    .bind(recipe_ids.to_vec())
    .fetch_all(db)
    .await
}

pub async fn ingredient_links(
    db: &PgPool,
    recipe_ids: &[Uuid],
) -> Result<Vec<(Uuid, Uuid)>, sqlx::Error> {
    sqlx::query_as::<_, (Uuid, Uuid)>(
        "SELECT recipe_id, ingredient_id FROM recipe_ingredients WHERE recipe_id = ANY($1)",
    )
    .bind(recipe_ids.to_vec())
    .fetch_all(db)
    .await
}

pub async fn tags_of(db: &PgPool, recipe_id: Uuid) -> Result<Vec<Tag>, sqlx::Error> {
    sqlx::query_as::<_, Tag>(
        r#"
        SELECT t.id, t.user_id, t.name
        FROM tags t
        JOIN recipe_tags rt ON rt.tag_id = t.id
        WHERE rt.recipe_id = $1
        ORDER BY t.name DESC
        "#,
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await
}

pub async fn ingredients_of(db: &PgPool, recipe_id: Uuid) -> Result<Vec<Ingredient>, sqlx::Error> {
    sqlx::query_as::<_, Ingredient>(
        r#"
        SELECT i.id, i.user_id, i.name
        FROM ingredients i
        JOIN recipe_ingredients ri ON ri.ingredient_id = i.id
        WHERE ri.recipe_id = $1
        ORDER BY i.name DESC
        "#,
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await
}

/// Insert a recipe and its join rows in one transaction. Referenced tags and
/// ingredients must belong to the caller.
pub async fn create(db: &PgPool, user_id: Uuid, new: NewRecipe<'_>) -> Result<Recipe, ApiError> {
    let tag_ids = dedup_ids(new.tag_ids);
    let ingredient_ids = dedup_ids(new.ingredient_ids);

    let mut tx = db.begin().await?;

    ensure_owned(&mut tx, "tags", user_id, &tag_ids, "tags").await?;
    ensure_owned(&mut tx, "ingredients", user_id, &ingredient_ids, "ingredients").await?;

    let sql = format!(
        "INSERT INTO recipes (user_id, title, time_minutes, price, link) \
         VALUES ($1, $2, $3, $4, $5) RETURNING {RECIPE_COLUMNS}"
    );
    let recipe = sqlx::query_as::<_, Recipe>(&sql)
        .bind(user_id)
        .bind(new.title)
        .bind(new.time_minutes)
        .bind(new.price)
        .bind(new.link)
        .fetch_one(&mut *tx)
        .await?;

    replace_links(&mut tx, "recipe_tags", "tag_id", recipe.id, &tag_ids).await?;
    replace_links(
        &mut tx,
        "recipe_ingredients",
        "ingredient_id",
        recipe.id,
        &ingredient_ids,
    )
    .await?;

    tx.commit().await?;
    Ok(recipe)
}

/// Apply a patch to the caller's recipe. Returns `None` when the recipe does
/// not exist or belongs to someone else.
pub async fn update(
    db: &PgPool,
    user_id: Uuid,
    recipe_id: Uuid,
    patch: RecipePatch,
) -> Result<Option<Recipe>, ApiError> {
    let mut tx = db.begin().await?;

    let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = $1 AND user_id = $2");
    let Some(existing) = sqlx::query_as::<_, Recipe>(&sql)
        .bind(recipe_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
    else {
        return Ok(None);
    };

    let tag_ids = patch.tag_ids.as_deref().map(dedup_ids);
    let ingredient_ids = patch.ingredient_ids.as_deref().map(dedup_ids);
    if let Some(ids) = &tag_ids {
        ensure_owned(&mut tx, "tags", user_id, ids, "tags").await?;
    }
    if let Some(ids) = &ingredient_ids {
        ensure_owned(&mut tx, "ingredients", user_id, ids, "ingredients").await?;
    }

    let title = patch.title.unwrap_or(existing.title);
    let time_minutes = patch.time_minutes.unwrap_or(existing.time_minutes);
    let price = patch.price.unwrap_or(existing.price);
    let link = patch.link.unwrap_or(existing.link);

    let sql = format!(
        "UPDATE recipes SET title = $3, time_minutes = $4, price = $5, link = $6 \
         WHERE id = $1 AND user_id = $2 RETURNING {RECIPE_COLUMNS}"
    );
    let recipe = sqlx::query_as::<_, Recipe>(&sql)
        .bind(recipe_id)
        .bind(user_id)
        .bind(&title)
        .bind(time_minutes)
        .bind(price)
        .bind(&link)
        .fetch_one(&mut *tx)
        .await?;

    if let Some(ids) = &tag_ids {
        replace_links(&mut tx, "recipe_tags", "tag_id", recipe.id, ids).await?;
    }
    if let Some(ids) = &ingredient_ids {
        replace_links(&mut tx, "recipe_ingredients", "ingredient_id", recipe.id, ids).await?;
    }

    tx.commit().await?;
    Ok(Some(recipe))
}

/// Delete the caller's recipe; join rows cascade, shared tags and ingredients
/// survive. Returns the deleted row.
pub async fn delete_for_user(
    db: &PgPool,
    user_id: Uuid,
    recipe_id: Uuid,
) -> Result<Option<Recipe>, sqlx::Error> {
    let sql = format!(
        "DELETE FROM recipes WHERE id = $1 AND user_id = $2 RETURNING {RECIPE_COLUMNS}"
    );
    sqlx::query_as::<_, Recipe>(&sql)
        .bind(recipe_id)
        .bind(user_id)
        .fetch_optional(db)
        .await
}

pub async fn set_image_key(db: &PgPool, recipe_id: Uuid, key: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE recipes SET image_key = $2 WHERE id = $1")
        .bind(recipe_id)
        .bind(key)
        .execute(db)
        .await?;
    Ok(())
}

fn dedup_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Every referenced ID must name a row of `table` owned by `user_id`.
async fn ensure_owned(
    tx: &mut Transaction<'_, Postgres>,
    table: &str,
    user_id: Uuid,
    ids: &[Uuid],
    field: &'static str,
) -> Result<(), ApiError> {
    if ids.is_empty() {
        return Ok(());
    }
    let sql = format!("SELECT count(*) FROM {table} WHERE user_id = $1 AND id = ANY($2)");
    let (count,): (i64,) = sqlx::query_as(&sql)
        .bind(user_id)
        .bind(ids.to_vec())
        .fetch_one(&mut **tx)
        .await?;
    if count as usize != ids.len() {
        return Err(ApiError::validation(field, "unknown id in list"));
    }
    Ok(())
}

/// Rewrite the join rows of one relation for a recipe.
async fn replace_links(
    tx: &mut Transaction<'_, Postgres>,
    link_table: &str,
    id_column: &str,
    recipe_id: Uuid,
    ids: &[Uuid],
) -> Result<(), sqlx::Error> {
    let sql = format!("DELETE FROM {link_table} WHERE recipe_id = $1");
    sqlx::query(&sql).bind(recipe_id).execute(&mut **tx).await?;
    let sql = format!("INSERT INTO {link_table} (recipe_id, {id_column}) VALUES ($1, $2)");
    for id in ids {
        sqlx::query(&sql)
            .bind(recipe_id)
            .bind(id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_preserves_distinct_ids() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let got = dedup_ids(&[a, b, a, a]);
        assert_eq!(got.len(), 2);
        assert!(got.contains(&a) && got.contains(&b));
    }

    #[test]
    fn default_filter_has_no_constraints() {
        let filter = RecipeFilter::default();
        assert!(filter.tag_ids.is_none());
        assert!(filter.ingredient_ids.is_none());
    }
}
