use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

/// API error taxonomy. Every domain-input failure is recovered into one of
/// these variants at the handler layer and rendered as a structured JSON body.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Bad or missing input, keyed by the offending field.
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },

    /// Login with credentials that do not match any active user.
    #[error("unable to authenticate with provided credentials")]
    BadCredentials,

    /// Missing, malformed or unknown bearer token.
    #[error("authentication required")]
    Unauthorized,

    /// Record absent, or owned by another user (deliberately indistinguishable).
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    fn status_and_body(&self) -> (StatusCode, Value) {
        match self {
            ApiError::Validation { field, message } => {
                let mut body = serde_json::Map::new();
                body.insert(field.to_string(), json!([message]));
                (StatusCode::BAD_REQUEST, Value::Object(body))
            }
            ApiError::BadCredentials => (
                StatusCode::BAD_REQUEST,
                json!({ "non_field_errors": ["Unable to authenticate with provided credentials"] }),
            ),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "detail": "Authentication credentials were not provided or are invalid" }),
            ),
            ApiError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                json!({ "detail": format!("{what} not found") }),
            ),
            ApiError::Database(_) | ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "detail": "Internal server error" }),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Database(e) => tracing::error!(error = %e, "database error"),
            ApiError::Internal(e) => tracing::error!(error = %e, "internal error"),
            _ => {}
        }
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_is_field_keyed_bad_request() {
        let err = ApiError::validation("password", "Ensure this field has at least 5 characters");
        let (status, body) = err.status_and_body();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["password"][0],
            "Ensure this field has at least 5 characters"
        );
    }

    #[test]
    fn bad_credentials_is_bad_request_without_field() {
        let (status, body) = ApiError::BadCredentials.status_and_body();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.get("non_field_errors").is_some());
    }

    #[test]
    fn unauthorized_and_not_found_statuses() {
        assert_eq!(
            ApiError::Unauthorized.status_and_body().0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::NotFound("Recipe").status_and_body().0,
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn infrastructure_errors_do_not_leak_details() {
        let err = ApiError::Internal(anyhow::anyhow!("bucket exploded"));
        let (status, body) = err.status_and_body();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.to_string().contains("bucket"));
    }
}
