// Authentication data models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// User role for access control decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// User database model
///
/// Deliberately not `Serialize`: the password hash, reset-token fields and
/// lockout counters must never reach a client. Use [`UserResponse`] instead.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub failed_login_attempts: i32,
    pub lock_until: Option<DateTime<Utc>>,
    pub reset_token_hash: Option<String>,
    pub reset_token_expire: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User response model (excludes all credential and lockout state)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Identity resolved from a verified session token
///
/// Ephemeral: carried in the request context, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Identity {
    pub id: Uuid,
    pub role: Role,
}

/// Registration request DTO
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
    #[validate(custom = "crate::validation::validate_password_strength")]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match."))]
    pub password_confirm: String,
    #[serde(default)]
    #[validate(length(max = 64, message = "Username must be at most 64 characters."))]
    pub username: String,
}

/// Login request DTO
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

/// Password-reset request DTO
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetRequestBody {
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
}

/// Password-reset confirmation DTO
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetConfirmBody {
    #[validate(length(min = 1, message = "Token is required."))]
    pub token: String,
    #[validate(custom = "crate::validation::validate_password_strength")]
    pub new_password: String,
}

/// Generic message response
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Login response: role only, the session travels in the cookie
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub role: Role,
}

/// Response for the protected route: identity refreshed from the store
#[derive(Debug, Serialize, ToSchema)]
pub struct ProtectedResponse {
    pub message: String,
    pub user: UserResponse,
}

/// Response for role-gated routes: token-resolved identity only
#[derive(Debug, Serialize, ToSchema)]
pub struct IdentityResponse {
    pub message: String,
    pub user: Identity,
}

/// Response for the optional-auth session probe
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub user: Option<Identity>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_uses_camel_case_fields() {
        let json = r#"{
            "email": "alice@example.com",
            "password": "Str0ng!Passw0rd123",
            "passwordConfirm": "Str0ng!Passw0rd123",
            "username": "alice"
        }"#;

        let req: RegisterRequest = serde_json::from_str(json).expect("deserialize");
        assert_eq!(req.email, "alice@example.com");
        assert_eq!(req.password_confirm, "Str0ng!Passw0rd123");
        assert_eq!(req.username, "alice");
    }

    #[test]
    fn register_request_username_defaults_to_empty() {
        let json = r#"{
            "email": "alice@example.com",
            "password": "Str0ng!Passw0rd123",
            "passwordConfirm": "Str0ng!Passw0rd123"
        }"#;

        let req: RegisterRequest = serde_json::from_str(json).expect("deserialize");
        assert_eq!(req.username, "");
    }

    #[test]
    fn reset_confirm_uses_camel_case_new_password() {
        let json = r#"{"token": "abc", "newPassword": "N3wStr0ng!Pass12"}"#;
        let req: ResetConfirmBody = serde_json::from_str(json).expect("deserialize");
        assert_eq!(req.new_password, "N3wStr0ng!Pass12");
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
    }

    #[test]
    fn user_response_drops_credential_fields() {
        let user = User {
            id: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            username: "alice".to_string(),
            password_hash: "$argon2id$...".to_string(),
            role: Role::User,
            failed_login_attempts: 3,
            lock_until: None,
            reset_token_hash: Some("deadbeef".to_string()),
            reset_token_expire: Some(Utc::now()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let response = UserResponse::from(user);
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("deadbeef"));
        assert!(!json.contains("failed_login_attempts"));
        assert!(json.contains("alice@example.com"));
    }
}
