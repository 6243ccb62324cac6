use serde::{Deserialize, Serialize};
use sqlx::types::Decimal;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::attrs::{Ingredient, Tag};
use crate::error::ApiError;
use crate::recipes::repo::Recipe;

/// Query parameters of the list endpoint. Each filter is a comma-separated
/// list of IDs.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub tags: Option<String>,
    pub ingredients: Option<String>,
}

pub fn parse_id_list(raw: &str, field: &'static str) -> Result<Vec<Uuid>, ApiError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Uuid::parse_str(s)
                .map_err(|_| ApiError::validation(field, format!("'{s}' is not a valid id")))
        })
        .collect()
}

pub const PRICE_MAX_DIGITS: u32 = 5;
pub const PRICE_DECIMAL_PLACES: u32 = 2;

/// Price must fit NUMERIC(5,2): non-negative, at most two decimal places,
/// below 1000.
pub fn validate_price(price: Decimal) -> Result<(), ApiError> {
    if price.is_sign_negative() {
        return Err(ApiError::validation(
            "price",
            "Ensure this value is greater than or equal to 0",
        ));
    }
    if price.scale() > PRICE_DECIMAL_PLACES {
        return Err(ApiError::validation(
            "price",
            format!("Ensure that there are no more than {PRICE_DECIMAL_PLACES} decimal places"),
        ));
    }
    if price >= Decimal::from(10i64.pow(PRICE_MAX_DIGITS - PRICE_DECIMAL_PLACES)) {
        return Err(ApiError::validation(
            "price",
            format!("Ensure that there are no more than {PRICE_MAX_DIGITS} digits in total"),
        ));
    }
    Ok(())
}

/// Create and full-update (PUT) body. Omitted `tags`/`ingredients` mean an
/// empty set, omitted `link` means none.
#[derive(Debug, Deserialize)]
pub struct RecipeWriteRequest {
    #[serde(default)]
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub tags: Vec<Uuid>,
    #[serde(default)]
    pub ingredients: Vec<Uuid>,
}

/// Partial update (PATCH) body; only supplied fields are touched.
#[derive(Debug, Deserialize)]
pub struct RecipePatchRequest {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub tags: Option<Vec<Uuid>>,
    pub ingredients: Option<Vec<Uuid>>,
}

/// List-item shape: related records as bare IDs.
#[derive(Debug, Serialize)]
pub struct RecipeListItem {
    pub id: Uuid,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<Uuid>,
    pub image: Option<String>,
    pub created_at: OffsetDateTime,
}

impl RecipeListItem {
    pub fn from_recipe(recipe: Recipe, tags: Vec<Uuid>, ingredients: Vec<Uuid>) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            tags,
            ingredients,
            image: recipe.image_key,
            created_at: recipe.created_at,
        }
    }
}

/// Detail shape: related records inlined.
#[derive(Debug, Serialize)]
pub struct RecipeDetails {
    pub id: Uuid,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: Option<String>,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<Ingredient>,
    pub image: Option<String>,
    pub created_at: OffsetDateTime,
}

impl RecipeDetails {
    pub fn from_recipe(recipe: Recipe, tags: Vec<Tag>, ingredients: Vec<Ingredient>) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            tags,
            ingredients,
            image: recipe.image_key,
            created_at: recipe.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeImageResponse {
    pub id: Uuid,
    pub image: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_ids() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let got = parse_id_list(&format!("{a},{b}"), "tags").unwrap();
        assert_eq!(got, vec![a, b]);
    }

    #[test]
    fn parsing_tolerates_spaces_and_trailing_commas() {
        let a = Uuid::new_v4();
        let got = parse_id_list(&format!(" {a} ,"), "tags").unwrap();
        assert_eq!(got, vec![a]);
    }

    #[test]
    fn parsing_rejects_non_ids() {
        let err = parse_id_list("1,2", "tags").unwrap_err();
        assert!(err.to_string().contains("tags"));
    }

    #[test]
    fn price_bounds() {
        assert!(validate_price("0".parse().unwrap()).is_ok());
        assert!(validate_price("5.00".parse().unwrap()).is_ok());
        assert!(validate_price("999.99".parse().unwrap()).is_ok());
        assert!(validate_price("1000".parse().unwrap()).is_err());
        assert!(validate_price("5.001".parse().unwrap()).is_err());
        assert!(validate_price("-1".parse().unwrap()).is_err());
    }

    #[test]
    fn write_request_defaults_relations_to_empty() {
        let req: RecipeWriteRequest =
            serde_json::from_str(r#"{"title":"Soup","time_minutes":10,"price":"5.00"}"#).unwrap();
        assert!(req.tags.is_empty());
        assert!(req.ingredients.is_empty());
        assert!(req.link.is_none());
    }

    #[test]
    fn write_request_accepts_numeric_price() {
        let req: RecipeWriteRequest =
            serde_json::from_str(r#"{"title":"Soup","time_minutes":10,"price":5.0}"#).unwrap();
        assert!(validate_price(req.price).is_ok());
    }

    #[test]
    fn patch_request_distinguishes_absent_fields() {
        let req: RecipePatchRequest = serde_json::from_str(r#"{"title":"Chicken tikka"}"#).unwrap();
        assert_eq!(req.title.as_deref(), Some("Chicken tikka"));
        assert!(req.tags.is_none());
        assert!(req.price.is_none());
    }
}
