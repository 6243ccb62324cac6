use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::email::normalize_email;
use crate::auth::password::hash_password;
use crate::auth::token::generate_key;
use crate::error::ApiError;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: OffsetDateTime,
}

const USER_COLUMNS: &str =
    "id, email, password_hash, name, is_active, is_staff, is_superuser, created_at";

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(db)
            .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Create a regular user. The email is normalized (blank rejected) and the
    /// password stored as an argon2 hash.
    pub async fn register(
        db: &PgPool,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<User, ApiError> {
        let email = normalize_email(email)?;
        let hash = hash_password(password)?;
        let sql = format!(
            "INSERT INTO users (email, password_hash, name) VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&email)
            .bind(&hash)
            .bind(name)
            .fetch_one(db)
            .await?;
        Ok(user)
    }

    /// Create a user, then elevate it to staff + superuser.
    pub async fn create_superuser(
        db: &PgPool,
        email: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        let user = Self::register(db, email, password, "").await?;
        let sql = format!(
            "UPDATE users SET is_staff = TRUE, is_superuser = TRUE WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .fetch_one(db)
            .await?;
        Ok(user)
    }

    /// Create the superuser unless an account with that email already exists.
    /// Returns whether a new account was created.
    pub async fn ensure_superuser(
        db: &PgPool,
        email: &str,
        password: &str,
    ) -> Result<bool, ApiError> {
        let normalized = normalize_email(email)?;
        if Self::find_by_email(db, &normalized).await?.is_some() {
            return Ok(false);
        }
        Self::create_superuser(db, email, password).await?;
        Ok(true)
    }

    /// Update name and/or password hash; absent fields keep their value.
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        name: Option<&str>,
        password_hash: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let sql = format!(
            "UPDATE users SET name = COALESCE($2, name), \
             password_hash = COALESCE($3, password_hash) \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(name)
            .bind(password_hash)
            .fetch_optional(db)
            .await
    }
}

/// One opaque token per user, created on first issuance and reused thereafter.
pub struct AuthToken;

impl AuthToken {
    /// Atomic fetch-or-create: the freshly generated key is discarded when the
    /// user already holds one.
    pub async fn get_or_create(db: &PgPool, user_id: Uuid) -> Result<String, sqlx::Error> {
        let candidate = generate_key();
        let (key,): (String,) = sqlx::query_as(
            r#"
            INSERT INTO auth_tokens (user_id, key)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET user_id = auth_tokens.user_id
            RETURNING key
            "#,
        )
        .bind(user_id)
        .bind(&candidate)
        .fetch_one(db)
        .await?;
        Ok(key)
    }

    /// Resolve a presented key to its owner: (user id, is_active).
    pub async fn resolve_key(db: &PgPool, key: &str) -> Result<Option<(Uuid, bool)>, sqlx::Error> {
        sqlx::query_as::<_, (Uuid, bool)>(
            r#"
            SELECT u.id, u.is_active
            FROM users u
            JOIN auth_tokens t ON t.user_id = u.id
            WHERE t.key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(db)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_json_never_contains_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "cook@example.com".into(),
            password_hash: "argon2-secret".into(),
            name: "Cook".into(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2-secret"));
        assert!(!json.contains("password_hash"));
        assert!(json.contains("cook@example.com"));
    }
}
