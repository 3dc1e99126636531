// Session token signing and verification

use crate::auth::{
    error::AuthError,
    models::{Identity, Role},
};
use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session tokens expire after one hour, matching the cookie max-age
pub const SESSION_TTL_SECONDS: i64 = 3600;

/// Claims carried by a session token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // user id
    pub role: Role,
    pub iat: i64, // issued at
    pub exp: i64, // expiry
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.sub,
            role: self.role,
        }
    }
}

/// Token service for signing and verifying session tokens
///
/// The signing secret is injected at construction (no ambient lookup), so
/// tests can run with isolated secrets. The process refuses to start
/// without one; see `main`.
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    ttl_seconds: i64,
}

impl TokenService {
    pub fn new(secret: String) -> Self {
        Self {
            secret,
            ttl_seconds: SESSION_TTL_SECONDS,
        }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Sign a compact `{id, role}` assertion valid for the session TTL
    pub fn issue(&self, user_id: Uuid, role: Role) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            role,
            iat: now,
            exp: now + self.ttl_seconds,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    /// Verify signature and expiry; any failure yields an untrusted token
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            _ => AuthError::InvalidToken,
        })
    }
}
