// Request authorization gate
//
// Identity resolution is a single function (cookie first, bearer header
// fallback) composed by two extractors: required-auth rejects when no
// identity can be resolved, optional-auth proceeds anonymously. Role
// requirements stack on top of required-auth and fail with a distinct
// forbidden outcome.

use crate::auth::{
    cookies::{extract_cookie, AUTH_COOKIE},
    error::AuthError,
    models::{Identity, Role},
    token::TokenService,
};
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use tracing::debug;

/// Pull the session token out of a request: cookie first, then
/// `Authorization: Bearer` for non-cookie clients
pub fn extract_token(parts: &Parts) -> Option<String> {
    if let Some(token) = extract_cookie(&parts.headers, AUTH_COOKIE) {
        return Some(token);
    }

    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}

/// Role requirement check, run after required-auth has resolved an
/// identity; a mismatch is forbidden, not unauthenticated
pub fn require_role(identity: Identity, required: Role) -> Result<(), AuthError> {
    if identity.role == required {
        Ok(())
    } else {
        Err(AuthError::InsufficientRole {
            required,
            actual: identity.role,
        })
    }
}

/// Required-auth extractor: rejects when no valid session is presented
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    TokenService: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts).ok_or(AuthError::Unauthenticated)?;
        let tokens = TokenService::from_ref(state);
        let claims = tokens.verify(&token)?;
        Ok(AuthenticatedUser(claims.identity()))
    }
}

/// Optional-auth extractor: absence or invalidity yields an anonymous
/// request instead of a rejection
#[derive(Debug, Clone, Copy)]
pub struct OptionalUser(pub Option<Identity>);

#[async_trait]
impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
    TokenService: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let identity = match extract_token(parts) {
            Some(token) => {
                let tokens = TokenService::from_ref(state);
                match tokens.verify(&token) {
                    Ok(claims) => Some(claims.identity()),
                    Err(_) => {
                        debug!("Optional auth: invalid token, proceeding anonymously");
                        None
                    }
                }
            }
            None => None,
        };
        Ok(OptionalUser(identity))
    }
}

/// Admin gate: required-auth plus a role requirement
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
    TokenService: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(identity) =
            AuthenticatedUser::from_request_parts(parts, state).await?;
        require_role(identity, Role::Admin)?;
        Ok(RequireAdmin(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use uuid::Uuid;

    #[derive(Clone)]
    struct TestState {
        tokens: TokenService,
    }

    impl FromRef<TestState> for TokenService {
        fn from_ref(state: &TestState) -> Self {
            state.tokens.clone()
        }
    }

    fn test_state() -> TestState {
        TestState {
            tokens: TokenService::new("test_secret_key_for_testing_purposes".to_string()),
        }
    }

    fn parts_with_headers(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[test]
    fn extract_token_prefers_cookie_over_header() {
        let parts = parts_with_headers(&[
            ("cookie", "token=from-cookie"),
            ("authorization", "Bearer from-header"),
        ]);
        assert_eq!(extract_token(&parts), Some("from-cookie".to_string()));
    }

    #[test]
    fn extract_token_falls_back_to_bearer() {
        let parts = parts_with_headers(&[("authorization", "Bearer from-header")]);
        assert_eq!(extract_token(&parts), Some("from-header".to_string()));
    }

    #[test]
    fn extract_token_rejects_non_bearer_scheme() {
        let parts = parts_with_headers(&[("authorization", "Basic dXNlcjpwYXNz")]);
        assert_eq!(extract_token(&parts), None);
    }

    #[tokio::test]
    async fn missing_token_is_unauthenticated() {
        let state = test_state();
        let mut parts = parts_with_headers(&[]);
        let err = AuthenticatedUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthenticated));
    }

    #[tokio::test]
    async fn invalid_token_is_forbidden() {
        let state = test_state();
        let mut parts = parts_with_headers(&[("authorization", "Bearer garbage")]);
        let err = AuthenticatedUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn valid_cookie_token_resolves_identity() {
        let state = test_state();
        let user_id = Uuid::new_v4();
        let token = state.tokens.issue(user_id, Role::User).unwrap();
        let cookie = format!("token={token}");
        let mut parts = parts_with_headers(&[("cookie", cookie.as_str())]);

        let AuthenticatedUser(identity) = AuthenticatedUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(identity.id, user_id);
        assert_eq!(identity.role, Role::User);
    }

    #[tokio::test]
    async fn optional_auth_proceeds_without_token() {
        let state = test_state();
        let mut parts = parts_with_headers(&[]);
        let OptionalUser(identity) = OptionalUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert!(identity.is_none());
    }

    #[tokio::test]
    async fn optional_auth_proceeds_on_invalid_token() {
        let state = test_state();
        let mut parts = parts_with_headers(&[("authorization", "Bearer garbage")]);
        let OptionalUser(identity) = OptionalUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert!(identity.is_none());
    }

    #[tokio::test]
    async fn optional_auth_attaches_valid_identity() {
        let state = test_state();
        let user_id = Uuid::new_v4();
        let token = state.tokens.issue(user_id, Role::Admin).unwrap();
        let bearer = format!("Bearer {token}");
        let mut parts = parts_with_headers(&[("authorization", bearer.as_str())]);

        let OptionalUser(identity) = OptionalUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(
            identity,
            Some(Identity {
                id: user_id,
                role: Role::Admin
            })
        );
    }

    #[tokio::test]
    async fn admin_gate_rejects_user_role_as_forbidden() {
        let state = test_state();
        let token = state.tokens.issue(Uuid::new_v4(), Role::User).unwrap();
        let bearer = format!("Bearer {token}");
        let mut parts = parts_with_headers(&[("authorization", bearer.as_str())]);

        let err = RequireAdmin::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::InsufficientRole {
                required: Role::Admin,
                actual: Role::User
            }
        ));
    }

    #[tokio::test]
    async fn admin_gate_accepts_admin_role() {
        let state = test_state();
        let user_id = Uuid::new_v4();
        let token = state.tokens.issue(user_id, Role::Admin).unwrap();
        let bearer = format!("Bearer {token}");
        let mut parts = parts_with_headers(&[("authorization", bearer.as_str())]);

        let RequireAdmin(identity) = RequireAdmin::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(identity.id, user_id);
    }

    #[test]
    fn require_role_distinguishes_mismatch() {
        let identity = Identity {
            id: Uuid::new_v4(),
            role: Role::User,
        };
        assert!(require_role(identity, Role::User).is_ok());
        assert!(matches!(
            require_role(identity, Role::Admin),
            Err(AuthError::InsufficientRole { .. })
        ));
    }
}
