// Authentication and authorization error types

use crate::auth::models::Role;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, warn};

/// Error taxonomy for the authentication subsystem
///
/// Every variant maps to one HTTP status code. Client-facing messages are
/// deliberately generic where the distinction would leak information
/// (credential failures, reset-token redemption); the distinction is kept
/// in the logs instead.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Malformed request input, rejected at the boundary
    #[error("request validation failed")]
    Validation(#[from] validator::ValidationErrors),

    /// Unknown email or wrong password; deliberately indistinguishable
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Account is inside an active lockout window
    #[error("account temporarily locked")]
    AccountLocked,

    /// No session token in cookie or Authorization header, or the
    /// referenced user no longer exists
    #[error("not authenticated")]
    Unauthenticated,

    /// Session token failed signature or structural checks
    #[error("invalid session token")]
    InvalidToken,

    /// Session token expired
    #[error("session token expired")]
    ExpiredToken,

    /// Authenticated but the role does not satisfy the route requirement
    #[error("insufficient role: required '{required}', got '{actual}'")]
    InsufficientRole { required: Role, actual: Role },

    /// Registration pre-check found the email already in use
    #[error("email already registered")]
    EmailTaken,

    /// Unique-constraint backstop when two registrations race past the
    /// pre-check
    #[error("email uniqueness conflict")]
    EmailConflict,

    /// Reset token unknown or expired; the two causes are not
    /// distinguished (oracle resistance)
    #[error("invalid or expired reset token")]
    InvalidResetToken,

    /// CSRF header missing or not matching the CSRF cookie
    #[error("CSRF token mismatch")]
    CsrfMismatch,

    /// Database failure; detail is logged, never sent to the client
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Password hashing or hash parsing failure
    #[error("password hashing failed")]
    Hash,

    /// Session token could not be signed
    #[error("token generation failed: {0}")]
    TokenGeneration(String),
}

#[derive(Serialize)]
struct ErrorItem {
    msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    param: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    errors: Vec<ErrorItem>,
}

/// Wire name for a validated field: the request DTOs rename to camelCase,
/// so the reported parameter must match what the client actually sent
fn wire_param(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper_next = false;
    for c in field.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Flatten validator output into the `{msg, param}` wire items
fn validation_items(errors: &validator::ValidationErrors) -> Vec<ErrorItem> {
    let mut items = Vec::new();
    for (field, field_errors) in errors.field_errors() {
        for err in field_errors {
            let msg = err
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value for '{}'.", field));
            items.push(ErrorItem {
                msg,
                param: Some(wire_param(field)),
            });
        }
    }
    if items.is_empty() {
        items.push(ErrorItem {
            msg: "Request validation failed.".to_string(),
            param: None,
        });
    }
    items
}

fn single(msg: &str) -> Vec<ErrorItem> {
    vec![ErrorItem {
        msg: msg.to_string(),
        param: None,
    }]
}

impl AuthError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::AccountLocked => StatusCode::LOCKED,
            AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::InvalidToken => StatusCode::FORBIDDEN,
            AuthError::ExpiredToken => StatusCode::FORBIDDEN,
            AuthError::InsufficientRole { .. } => StatusCode::FORBIDDEN,
            AuthError::EmailTaken => StatusCode::BAD_REQUEST,
            AuthError::EmailConflict => StatusCode::CONFLICT,
            AuthError::InvalidResetToken => StatusCode::BAD_REQUEST,
            AuthError::CsrfMismatch => StatusCode::FORBIDDEN,
            AuthError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::Hash => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::TokenGeneration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let items = match &self {
            AuthError::Validation(errors) => {
                debug!("Validation error: {:?}", errors);
                validation_items(errors)
            }
            AuthError::InvalidCredentials => {
                // logged with detail at the call site; generic here
                single("Invalid email or password.")
            }
            AuthError::AccountLocked => {
                single("Account temporarily locked. Please try again later.")
            }
            AuthError::Unauthenticated => {
                warn!("Unauthenticated request to protected route");
                single("Not authenticated.")
            }
            AuthError::InvalidToken => {
                warn!("Invalid session token presented");
                single("Access denied.")
            }
            AuthError::ExpiredToken => {
                debug!("Expired session token presented");
                single("Access denied.")
            }
            AuthError::InsufficientRole { required, actual } => {
                warn!(
                    "Authorization failed: required role '{}', user has role '{}'",
                    required, actual
                );
                single("Insufficient permissions.")
            }
            AuthError::EmailTaken => single("Email already registered."),
            AuthError::EmailConflict => {
                warn!("Unique-constraint conflict during registration");
                single("Email already registered.")
            }
            AuthError::InvalidResetToken => {
                debug!("Invalid or expired reset token presented");
                single("Invalid or expired token.")
            }
            AuthError::CsrfMismatch => {
                warn!("CSRF token mismatch on state-changing request");
                single("Invalid CSRF token.")
            }
            AuthError::Database(e) => {
                error!("Database error in auth: {:?}", e);
                single("Internal server error.")
            }
            AuthError::Hash => {
                error!("Password hashing error");
                single("Internal server error.")
            }
            AuthError::TokenGeneration(msg) => {
                error!("Token generation error: {}", msg);
                single("Internal server error.")
            }
        };

        (status, Json(ErrorBody { errors: items })).into_response()
    }
}
