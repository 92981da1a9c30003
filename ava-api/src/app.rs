/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use ava_api::{app::{build_router, AppState}, config::Config};
/// use ava_shared::{auth::jwt::TokenCodec, db::pool::create_pool, postal::ViaCepClient, repository::Repositories};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.database.clone()).await?;
/// let postal = ViaCepClient::new(&config.postal.base_url, config.postal.timeout)?;
///
/// let state = AppState::new(
///     Repositories::postgres(pool.clone()),
///     Arc::new(postal),
///     Arc::new(TokenCodec::new(config.jwt.secret.clone())),
///     Some(pool),
/// );
/// let app = build_router(state, &config.api);
/// # Ok(())
/// # }
/// ```

use crate::{config::ApiConfig, routes};
use ava_shared::{
    auth::{jwt::TokenCodec, middleware::jwt_auth_middleware},
    postal::PostalLookup,
    repository::{Repositories, RoleRepository},
    services::{AccountService, AuthService, ClassService},
};
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler via Axum's `State` extractor; every field is a
/// cheap handle.
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub auth: AuthService,
    pub classes: ClassService,
    pub roles: Arc<dyn RoleRepository>,
    pub codec: Arc<TokenCodec>,

    /// Pool used by the health check; `None` when running on in-memory storage
    pub db: Option<PgPool>,
}

impl AppState {
    /// Wires the services over one set of repositories
    pub fn new(
        repos: Repositories,
        postal: Arc<dyn PostalLookup>,
        codec: Arc<TokenCodec>,
        db: Option<PgPool>,
    ) -> Self {
        Self {
            accounts: AccountService::new(repos.clone(), postal),
            auth: AuthService::new(repos.accounts.clone(), codec.clone()),
            classes: ClassService::new(repos.classes.clone()),
            roles: repos.roles,
            codec,
            db,
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET    /health                  # public
/// ├── POST   /auth/login              # public
/// ├── GET    /users                   # bearer token required from here on
/// ├── POST   /users
/// ├── GET    /users/:id
/// ├── PATCH  /users/:id
/// ├── DELETE /users/:id               # deactivate
/// ├── PATCH  /users/:id/reactivate
/// ├── GET    /roles
/// ├── GET    /roles/:id
/// ├── GET    /classes
/// ├── POST   /classes
/// ├── GET    /classes/:id
/// ├── PATCH  /classes/:id
/// └── DELETE /classes/:id
/// ```
///
/// # Middleware Stack
///
/// 1. Bearer authentication (protected routes only)
/// 2. Logging (tower-http TraceLayer)
/// 3. CORS (tower-http CorsLayer)
pub fn build_router(state: AppState, api: &ApiConfig) -> Router {
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/auth/login", post(routes::auth::login));

    let protected_routes = Router::new()
        .route(
            "/users",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route(
            "/users/:id",
            get(routes::users::get_user)
                .patch(routes::users::update_user)
                .delete(routes::users::deactivate_user),
        )
        .route("/users/:id/reactivate", patch(routes::users::reactivate_user))
        .route("/roles", get(routes::roles::list_roles))
        .route("/roles/:id", get(routes::roles::get_role))
        .route(
            "/classes",
            get(routes::classes::list_classes).post(routes::classes::create_class),
        )
        .route(
            "/classes/:id",
            get(routes::classes::get_class)
                .patch(routes::classes::update_class)
                .delete(routes::classes::delete_class),
        )
        .route_layer(middleware::from_fn_with_state(
            state.codec.clone(),
            jwt_auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&api.cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}
