use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::auth::{
    dto::{CreateUserRequest, TokenRequest, TokenResponse, UpdateMeRequest, UserResponse},
    email::{is_valid_email, normalize_email},
    extractors::AuthUser,
    password::{hash_password, verify_password, MIN_PASSWORD_LEN},
    repo::{AuthToken, User},
};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_user))
        .route("/token", post(create_token))
        // GET + PATCH only; anything else gets a 405 from the router
        .route("/me", get(get_me).patch(update_me))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let email = normalize_email(&payload.email)?;
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::validation("email", "Enter a valid email address"));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(
            "password",
            format!("Ensure this field has at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if User::find_by_email(&state.db, &email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::validation(
            "email",
            "A user with that email already exists",
        ));
    }

    let user = User::register(&state.db, &email, &payload.password, &payload.name).await?;

    info!(user_id = %user.id, email = %user.email, "user created");
    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            email: user.email,
            name: user.name,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn create_token(
    State(state): State<AppState>,
    Json(payload): Json<TokenRequest>,
) -> ApiResult<Json<TokenResponse>> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::validation("email", "This field may not be blank"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation(
            "password",
            "This field may not be blank",
        ));
    }

    let email = normalize_email(&payload.email)?;
    // A missing account and a wrong password answer identically, so the
    // endpoint does not reveal which emails are registered.
    let user = match User::find_by_email(&state.db, &email).await? {
        Some(u) => u,
        None => {
            warn!(email = %email, "token request for unknown email");
            return Err(ApiError::BadCredentials);
        }
    };

    if !user.is_active || !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "token request with bad credentials");
        return Err(ApiError::BadCredentials);
    }

    let key = AuthToken::get_or_create(&state.db, user.id).await?;
    info!(user_id = %user.id, "token issued");
    Ok(Json(TokenResponse { token: key }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<UserResponse>> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    Ok(Json(UserResponse {
        email: user.email,
        name: user.name,
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateMeRequest>,
) -> ApiResult<Json<UserResponse>> {
    let password_hash = match payload.password.as_deref() {
        Some(password) => {
            if password.chars().count() < MIN_PASSWORD_LEN {
                return Err(ApiError::validation(
                    "password",
                    format!("Ensure this field has at least {MIN_PASSWORD_LEN} characters"),
                ));
            }
            Some(hash_password(password)?)
        }
        None => None,
    };

    let user = User::update_profile(
        &state.db,
        user_id,
        payload.name.as_deref(),
        password_hash.as_deref(),
    )
    .await?
    .ok_or(ApiError::Unauthorized)?;

    info!(user_id = %user.id, "profile updated");
    Ok(Json(UserResponse {
        email: user.email,
        name: user.name,
    }))
}
