// HTTP handlers for authentication endpoints

use crate::auth::{
    error::AuthError,
    middleware::{AuthenticatedUser, OptionalUser, RequireAdmin},
    models::{
        IdentityResponse, LoginRequest, LoginResponse, MessageResponse, ProtectedResponse,
        RegisterRequest, ResetConfirmBody, ResetRequestBody, SessionResponse,
    },
};
use crate::AppState;
use axum::{
    extract::State,
    http::{header::SET_COOKIE, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use tracing::info;
use validator::Validate;

/// The reset-request response is identical for known and unknown emails
const RESET_REQUEST_MESSAGE: &str = "If that email exists, a reset link has been sent.";

/// Register a new user
/// POST /register
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = MessageResponse),
        (status = 400, description = "Validation failure or email already registered"),
        (status = 409, description = "Concurrent registration conflict")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), AuthError> {
    payload.validate()?;
    state.auth.register(&payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Registration successful.".to_string(),
        }),
    ))
}

/// Authenticate and mint a session cookie
/// POST /login
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; session and CSRF cookies set", body = LoginResponse),
        (status = 400, description = "Validation failure"),
        (status = 401, description = "Invalid email or password"),
        (status = 423, description = "Account temporarily locked")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    payload.validate()?;
    let session = state.auth.login(&payload.email, &payload.password).await?;

    let ttl = state.auth.tokens.ttl_seconds();
    let cookies = AppendHeaders([
        (SET_COOKIE, state.auth.cookies.auth_cookie(&session.token, ttl)),
        (
            SET_COOKIE,
            state.auth.cookies.csrf_cookie(&session.csrf_token, ttl),
        ),
    ]);

    Ok((
        cookies,
        Json(LoginResponse {
            message: "Login successful.".to_string(),
            role: session.role,
        }),
    ))
}

/// Clear the session cookie
/// POST /logout
///
/// Stateless sessions: the token itself is not revoked server-side, the
/// cookie is simply expired on the client.
#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 200, description = "Session cookie cleared", body = MessageResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Invalid session or CSRF token")
    ),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<impl IntoResponse, AuthError> {
    info!("Logout: user_id={} role={}", identity.id, identity.role);

    let cookies = AppendHeaders([
        (SET_COOKIE, state.auth.cookies.clear_auth_cookie()),
        (SET_COOKIE, state.auth.cookies.clear_csrf_cookie()),
    ]);

    Ok((
        cookies,
        Json(MessageResponse {
            message: "Logout successful.".to_string(),
        }),
    ))
}

/// Request a password-reset link
/// POST /password-reset/request
#[utoipa::path(
    post,
    path = "/password-reset/request",
    request_body = ResetRequestBody,
    responses(
        (status = 200, description = "Generic response regardless of whether the email exists", body = MessageResponse),
        (status = 400, description = "Validation failure")
    ),
    tag = "password-reset"
)]
pub async fn password_reset_request(
    State(state): State<AppState>,
    Json(payload): Json<ResetRequestBody>,
) -> Result<Json<MessageResponse>, AuthError> {
    payload.validate()?;
    state.auth.password_reset_request(&payload.email).await?;

    Ok(Json(MessageResponse {
        message: RESET_REQUEST_MESSAGE.to_string(),
    }))
}

/// Redeem a reset token and set a new password
/// POST /password-reset/confirm
#[utoipa::path(
    post,
    path = "/password-reset/confirm",
    request_body = ResetConfirmBody,
    responses(
        (status = 200, description = "Password replaced", body = MessageResponse),
        (status = 400, description = "Validation failure, or invalid/expired token")
    ),
    tag = "password-reset"
)]
pub async fn password_reset_confirm(
    State(state): State<AppState>,
    Json(payload): Json<ResetConfirmBody>,
) -> Result<Json<MessageResponse>, AuthError> {
    payload.validate()?;
    state
        .auth
        .password_reset_confirm(&payload.token, &payload.new_password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password reset successful.".to_string(),
    }))
}

/// Protected probe: fresh email and role from the store
/// GET /protected
#[utoipa::path(
    get,
    path = "/protected",
    responses(
        (status = 200, description = "Resolved identity", body = ProtectedResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Invalid session token")
    ),
    tag = "protected"
)]
pub async fn protected(
    State(state): State<AppState>,
    AuthenticatedUser(identity): AuthenticatedUser,
) -> Result<Json<ProtectedResponse>, AuthError> {
    let user = state.auth.current_user(identity.id).await?;

    Ok(Json(ProtectedResponse {
        message: "Access to protected route granted.".to_string(),
        user: user.into(),
    }))
}

/// Admin-gated probe
/// GET /protected/admin-check
#[utoipa::path(
    get,
    path = "/protected/admin-check",
    responses(
        (status = 200, description = "Admin confirmed", body = IdentityResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Authenticated but not admin")
    ),
    tag = "protected"
)]
pub async fn admin_check(
    RequireAdmin(identity): RequireAdmin,
) -> Result<Json<IdentityResponse>, AuthError> {
    Ok(Json(IdentityResponse {
        message: "Admin confirmed.".to_string(),
        user: identity,
    }))
}

/// Optional-auth session probe: anonymous callers get `user: null`
/// GET /session
#[utoipa::path(
    get,
    path = "/session",
    responses(
        (status = 200, description = "Current identity, or null when anonymous", body = SessionResponse)
    ),
    tag = "auth"
)]
pub async fn session(OptionalUser(identity): OptionalUser) -> Json<SessionResponse> {
    Json(SessionResponse { user: identity })
}
