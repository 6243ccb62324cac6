use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, PgPool};
use uuid::Uuid;

/// A user-owned attribute living in its own table. `TABLE` is the only thing
/// that differs between tags and ingredients.
pub trait OwnedAttr:
    for<'r> FromRow<'r, PgRow> + Serialize + Send + Unpin + 'static
{
    const TABLE: &'static str;
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ingredient {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub name: String,
}

impl OwnedAttr for Tag {
    const TABLE: &'static str = "tags";
}

impl OwnedAttr for Ingredient {
    const TABLE: &'static str = "ingredients";
}

pub async fn list_for_user<A: OwnedAttr>(
    db: &PgPool,
    user_id: Uuid,
) -> Result<Vec<A>, sqlx::Error> {
    let sql = format!(
        "SELECT id, user_id, name FROM {} WHERE user_id = $1 ORDER BY name DESC",
        A::TABLE
    );
    sqlx::query_as::<_, A>(&sql).bind(user_id).fetch_all(db).await
}

pub async fn create_for_user<A: OwnedAttr>(
    db: &PgPool,
    user_id: Uuid,
    name: &str,
) -> Result<A, sqlx::Error> {
    let sql = format!(
        "INSERT INTO {} (user_id, name) VALUES ($1, $2) RETURNING id, user_id, name",
        A::TABLE
    );
    sqlx::query_as::<_, A>(&sql)
        .bind(user_id)
        .bind(name)
        .fetch_one(db)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attr_json_exposes_id_and_name_only() {
        let tag = Tag {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Vegan".into(),
        };
        let json = serde_json::to_value(&tag).unwrap();
        assert!(json.get("id").is_some());
        assert_eq!(json["name"], "Vegan");
        assert!(json.get("user_id").is_none());
    }

    #[test]
    fn tables_differ_per_attr() {
        assert_eq!(Tag::TABLE, "tags");
        assert_eq!(Ingredient::TABLE, "ingredients");
    }
}
