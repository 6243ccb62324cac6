use serde::{Deserialize, Serialize};

/// Request body for account creation.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

/// Request body for token issuance.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for profile updates; absent fields are left alone.
#[derive(Debug, Deserialize)]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Public part of the user returned to the client. The password never
/// appears here.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_response_serialization() {
        let response = UserResponse {
            email: "test@example.com".to_string(),
            name: "Test".to_string(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(!json.contains("password"));
    }

    #[test]
    fn create_user_request_defaults_missing_fields_to_empty() {
        let req: CreateUserRequest = serde_json::from_str("{}").unwrap();
        assert!(req.email.is_empty());
        assert!(req.password.is_empty());
        assert!(req.name.is_empty());
    }

    #[test]
    fn update_me_request_distinguishes_absent_fields() {
        let req: UpdateMeRequest = serde_json::from_str(r#"{"name":"New Name"}"#).unwrap();
        assert_eq!(req.name.as_deref(), Some("New Name"));
        assert!(req.password.is_none());
    }
}
