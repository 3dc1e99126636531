mod auth;
mod db;
mod validation;

use std::sync::Arc;

use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use auth::{
    csrf::csrf_guard,
    models::{
        Identity, IdentityResponse, LoginRequest, LoginResponse, MessageResponse,
        ProtectedResponse, RegisterRequest, ResetConfirmBody, ResetRequestBody, Role,
        SessionResponse, UserResponse,
    },
    AuthService, CookiePolicy, LogMailer, TokenService, UserRepository,
};
use db::DbPool;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::handlers::register,
        auth::handlers::login,
        auth::handlers::logout,
        auth::handlers::password_reset_request,
        auth::handlers::password_reset_confirm,
        auth::handlers::protected,
        auth::handlers::admin_check,
        auth::handlers::session,
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            ResetRequestBody,
            ResetConfirmBody,
            MessageResponse,
            LoginResponse,
            ProtectedResponse,
            IdentityResponse,
            SessionResponse,
            UserResponse,
            Identity,
            Role,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login, logout and session endpoints"),
        (name = "password-reset", description = "Password-reset token lifecycle"),
        (name = "protected", description = "Authenticated probe endpoints")
    ),
    info(
        title = "Storefront API",
        version = "1.0.0",
        description = "Authentication and account-security backend for the storefront"
    )
)]
struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub auth: AuthService,
}

// Lets the auth extractors pull the token verifier straight out of state
impl FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> Self {
        state.auth.tokens.clone()
    }
}

/// Handler for GET /health
async fn health() -> &'static str {
    "ok"
}

/// Creates and configures the application router
/// Maps all endpoints to their handlers and adds CSRF and CORS middleware
pub fn create_router(state: AppState) -> Router {
    use axum::http::{header, HeaderValue, Method};
    use tower_http::cors::{Any, CorsLayer};

    // With FRONTEND_ORIGIN set, lock CORS down to those origins and allow
    // credentials (cookies); otherwise stay permissive for local tooling
    let cors = match std::env::var("FRONTEND_ORIGIN") {
        Ok(origins) => {
            let origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                ])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    header::HeaderName::from_static(auth::csrf::CSRF_HEADER),
                ])
                .allow_credentials(true)
        }
        Err(_) => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Account endpoints
        .route("/register", post(auth::handlers::register))
        .route("/login", post(auth::handlers::login))
        .route("/logout", post(auth::handlers::logout))
        .route("/session", get(auth::handlers::session))
        // Password-reset lifecycle
        .route(
            "/password-reset/request",
            post(auth::handlers::password_reset_request),
        )
        .route(
            "/password-reset/confirm",
            post(auth::handlers::password_reset_confirm),
        )
        // Auth probes
        .route("/protected", get(auth::handlers::protected))
        .route("/protected/admin-check", get(auth::handlers::admin_check))
        .route("/health", get(health))
        // Double-submit check runs before any cookie-authenticated mutation
        .layer(axum::middleware::from_fn(csrf_guard))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Storefront API - Starting...");

    // Get configuration from environment variables
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");
    let jwt_secret = std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in environment");
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let production = std::env::var("APP_ENV")
        .map(|v| v == "production")
        .unwrap_or(false);
    let public_base_url = std::env::var("PUBLIC_BASE_URL")
        .unwrap_or_else(|_| format!("http://localhost:{}", port));

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&database_url)
        .await
        .expect("Failed to create database pool");

    // Run SQLx migrations on startup
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations completed successfully");

    // In production the front-end is served from another origin, so session
    // cookies need SameSite=None + Secure; locally Lax over plain HTTP is fine
    let cookies = CookiePolicy::new(production, production);
    let auth_service = AuthService::new(
        UserRepository::new(db_pool.clone()),
        TokenService::new(jwt_secret),
        cookies,
        Arc::new(LogMailer),
        public_base_url,
    );

    let state = AppState {
        db: db_pool,
        auth: auth_service,
    };

    // Per-client-IP rate limiting; requires connect-info from the listener
    let governor_config = Box::new(
        GovernorConfigBuilder::default()
            .per_second(2)
            .burst_size(20)
            .finish()
            .expect("Invalid rate limiter configuration"),
    );

    let app = create_router(state).layer(GovernorLayer {
        config: Box::leak(governor_config),
    });

    // Start the Axum server
    let addr = format!("{}:{}", host, port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Storefront API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .expect("Server error");
}

#[cfg(test)]
mod tests;
