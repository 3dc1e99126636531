// Database repository for user records

use crate::auth::{error::AuthError, lockout::LockoutState, models::User};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, username, password_hash, role, failed_login_attempts, \
     lock_until, reset_token_hash, reset_token_expire, created_at, updated_at";

/// User repository for database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user; role is always `user` at registration
    pub async fn create_user(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
    ) -> Result<User, AuthError> {
        let query = format!(
            "INSERT INTO users (email, username, password_hash) \
             VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .bind(username)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                // Backstop for two registrations racing past the pre-check
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return AuthError::EmailConflict;
                    }
                }
                AuthError::Database(e)
            })?;

        Ok(user)
    }

    /// Find a user by email (case-insensitive)
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Find a user by id
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Check whether an email is already registered
    pub async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists.0)
    }

    /// Persist the lockout fields after a transition
    ///
    /// Read-modify-write: concurrent failed attempts may under-count, an
    /// accepted tradeoff for human-paced logins.
    pub async fn save_lockout(&self, id: Uuid, state: &LockoutState) -> Result<(), AuthError> {
        sqlx::query("UPDATE users SET failed_login_attempts = $2, lock_until = $3 WHERE id = $1")
            .bind(id)
            .bind(state.failed_attempts)
            .bind(state.lock_until)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Store a pending reset token (hash only) with its expiry
    pub async fn set_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        sqlx::query(
            "UPDATE users SET reset_token_hash = $2, reset_token_expire = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Redeem a reset token: match by hash and expiry, install the new
    /// password and clear the token fields in one conditional update
    ///
    /// The single statement guarantees at-most-once redemption even under
    /// concurrent confirm requests. A password change also clears any
    /// lockout state.
    pub async fn redeem_reset_token(
        &self,
        token_hash: &str,
        new_password_hash: &str,
    ) -> Result<Option<User>, AuthError> {
        let query = format!(
            "UPDATE users \
             SET password_hash = $2, \
                 reset_token_hash = NULL, \
                 reset_token_expire = NULL, \
                 failed_login_attempts = 0, \
                 lock_until = NULL \
             WHERE reset_token_hash = $1 AND reset_token_expire > NOW() \
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(token_hash)
            .bind(new_password_hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}
