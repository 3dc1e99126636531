// Authentication service - business logic layer

use crate::auth::{
    csrf,
    cookies::CookiePolicy,
    error::AuthError,
    lockout::{self, LockDecision, LockoutState},
    mailer::Mailer,
    models::{RegisterRequest, Role, User},
    password::PasswordService,
    repository::UserRepository,
    reset,
    token::TokenService,
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Mask an email for logs: keep the first three characters and the domain
pub fn mask_email(email: &str) -> String {
    match email.find('@') {
        Some(at) => {
            let local = &email[..at];
            if local.chars().count() > 3 {
                let prefix: String = local.chars().take(3).collect();
                format!("{}***{}", prefix, &email[at..])
            } else {
                email.to_string()
            }
        }
        None => email.to_string(),
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A freshly minted session: the signed token, its CSRF companion and the
/// role to report back to the client
pub struct LoginSession {
    pub token: String,
    pub csrf_token: String,
    pub role: Role,
}

/// Authentication service coordinating all auth operations
#[derive(Clone)]
pub struct AuthService {
    repo: UserRepository,
    pub tokens: TokenService,
    pub cookies: CookiePolicy,
    mailer: Arc<dyn Mailer>,
    reset_link_base: String,
}

impl AuthService {
    pub fn new(
        repo: UserRepository,
        tokens: TokenService,
        cookies: CookiePolicy,
        mailer: Arc<dyn Mailer>,
        reset_link_base: String,
    ) -> Self {
        Self {
            repo,
            tokens,
            cookies,
            mailer,
            reset_link_base,
        }
    }

    /// Register a new user; role is fixed to `user`
    pub async fn register(&self, request: &RegisterRequest) -> Result<(), AuthError> {
        let email = normalize_email(&request.email);

        if self.repo.email_exists(&email).await? {
            debug!(
                "Registration rejected, email already exists: {}",
                mask_email(&email)
            );
            return Err(AuthError::EmailTaken);
        }

        let password_hash = PasswordService::hash(&request.password)?;
        let user = self
            .repo
            .create_user(&email, request.username.trim(), &password_hash)
            .await?;

        info!("New user registered: {}", mask_email(&user.email));
        Ok(())
    }

    /// Authenticate credentials and mint a session
    ///
    /// Order matters: the lazy lock-expiry clear runs before the locked
    /// short-circuit, and a locked account never reaches the password
    /// check (no hashing cost, no clock reset).
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginSession, AuthError> {
        let email = normalize_email(email);

        let user = match self.repo.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                // Collapsed into the generic 401; the distinction lives here
                debug!("Login failed, unknown email: {}", mask_email(&email));
                return Err(AuthError::InvalidCredentials);
            }
        };

        let now = Utc::now();
        let state = LockoutState::new(user.failed_login_attempts, user.lock_until);
        let (state, decision) = lockout::evaluate(state, now);
        if state.failed_attempts != user.failed_login_attempts || state.lock_until != user.lock_until
        {
            // Expired lock cleared lazily; persist before anything else
            self.repo.save_lockout(user.id, &state).await?;
        }
        if let LockDecision::Locked { until } = decision {
            debug!(
                "Account locked until {}: {}",
                until.to_rfc3339(),
                mask_email(&email)
            );
            return Err(AuthError::AccountLocked);
        }

        if !PasswordService::verify(password, &user.password_hash)? {
            let state = lockout::record_failure(state, now);
            debug!(
                "Wrong password ({}/{}): {}",
                state.failed_attempts,
                lockout::MAX_FAILED_ATTEMPTS,
                mask_email(&email)
            );
            if state.lock_until.is_some() {
                warn!(
                    "Account locked for {} minutes: {}",
                    lockout::LOCK_DURATION_MINUTES,
                    mask_email(&email)
                );
            }
            self.repo.save_lockout(user.id, &state).await?;
            return Err(AuthError::InvalidCredentials);
        }

        self.repo
            .save_lockout(user.id, &lockout::record_success())
            .await?;

        let token = self.tokens.issue(user.id, user.role)?;
        let csrf_token = csrf::generate_csrf_token();
        info!("User logged in: {}", mask_email(&email));

        Ok(LoginSession {
            token,
            csrf_token,
            role: user.role,
        })
    }

    /// Issue a reset token and hand the link to the mailer
    ///
    /// Returns `Ok(())` for unknown emails too; the HTTP response must be
    /// byte-identical in both cases (enumeration resistance).
    pub async fn password_reset_request(&self, email: &str) -> Result<(), AuthError> {
        let email = normalize_email(email);

        let user = match self.repo.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                debug!(
                    "Password reset for unknown email (generic response): {}",
                    mask_email(&email)
                );
                return Ok(());
            }
        };

        let raw_token = reset::generate_token();
        let token_hash = reset::hash_token(&raw_token);
        let expires_at = Utc::now() + Duration::minutes(reset::RESET_TOKEN_TTL_MINUTES);
        self.repo
            .set_reset_token(user.id, &token_hash, expires_at)
            .await?;

        info!(
            "Password-reset token created (hash stored) for {}",
            mask_email(&email)
        );

        let reset_link = format!(
            "{}/password-reset-confirm.html?token={}",
            self.reset_link_base, raw_token
        );
        self.mailer.send_password_reset(&email, &reset_link);

        Ok(())
    }

    /// Redeem a reset token and install the new password
    ///
    /// Single-use: the conditional update clears the token fields in the
    /// same statement that matches them, so a second redemption of the
    /// same token always fails. Wrong and expired tokens are not
    /// distinguished.
    pub async fn password_reset_confirm(
        &self,
        raw_token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let new_password_hash = PasswordService::hash(new_password)?;
        let token_hash = reset::hash_token(raw_token);

        let user = self
            .repo
            .redeem_reset_token(&token_hash, &new_password_hash)
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        info!("Password reset for: {}", mask_email(&user.email));
        Ok(())
    }

    /// Load the current user record for a verified identity
    ///
    /// The token may outlive the account; a missing row is treated as
    /// unauthenticated.
    pub async fn current_user(&self, id: Uuid) -> Result<User, AuthError> {
        match self.repo.find_by_id(id).await? {
            Some(user) => Ok(user),
            None => {
                warn!("Session token references missing user: {}", id);
                Err(AuthError::Unauthenticated)
            }
        }
    }
}
