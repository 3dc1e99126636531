// Authentication and account-security module
// Credential handling, lockout, password-reset lifecycle, JWT session
// cookies, CSRF double-submit, and role-gated route guards

pub mod cookies;
pub mod csrf;
pub mod error;
pub mod handlers;
pub mod lockout;
pub mod mailer;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod reset;
pub mod service;
pub mod token;

// Re-export commonly used types
pub use cookies::CookiePolicy;
pub use error::AuthError;
pub use mailer::{LogMailer, Mailer};
pub use middleware::{AuthenticatedUser, OptionalUser, RequireAdmin};
pub use models::{Identity, LoginRequest, RegisterRequest, Role, User, UserResponse};
pub use repository::UserRepository;
pub use service::AuthService;
pub use token::TokenService;
