// CSRF protection for cookie-authenticated state changes
//
// Double-submit pattern: login issues a random CSRF token as a
// script-readable cookie, and every state-changing request that presents
// the session cookie must echo it in the `X-XSRF-TOKEN` header. Requests
// authenticating via the Authorization header are exempt, since a
// cross-site attacker cannot set that header.

use crate::auth::{
    cookies::{extract_cookie, AUTH_COOKIE, CSRF_COOKIE},
    error::AuthError,
};
use axum::{body::Body, extract::Request, http::Method, middleware::Next, response::Response};
use rand::{rngs::OsRng, RngCore};

/// Header carrying the echoed CSRF token
pub const CSRF_HEADER: &str = "x-xsrf-token";

/// Generate a random CSRF token, hex-encoded (256 bits)
pub fn generate_csrf_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Constant-time token comparison
pub fn tokens_match(cookie_token: &str, header_token: &str) -> bool {
    if cookie_token.len() != header_token.len() {
        return false;
    }
    let mut result = 0u8;
    for (a, b) in cookie_token.bytes().zip(header_token.bytes()) {
        result |= a ^ b;
    }
    result == 0
}

/// Middleware guarding state-changing routes
///
/// Only enforced when the session cookie is the credential transport;
/// safe methods and bearer-only requests pass through.
pub async fn csrf_guard(req: Request<Body>, next: Next) -> Result<Response, AuthError> {
    let state_changing = matches!(
        *req.method(),
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    );

    if state_changing && extract_cookie(req.headers(), AUTH_COOKIE).is_some() {
        let cookie_token =
            extract_cookie(req.headers(), CSRF_COOKIE).ok_or(AuthError::CsrfMismatch)?;
        let header_token = req
            .headers()
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::CsrfMismatch)?;

        if !tokens_match(&cookie_token, header_token) {
            return Err(AuthError::CsrfMismatch);
        }
    }

    Ok(next.run(req).await)
}
