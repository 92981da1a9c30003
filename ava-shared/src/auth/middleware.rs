/// Bearer token authentication middleware for Axum
///
/// Reads `Authorization: Bearer <token>`, verifies the token with the shared
/// [`TokenCodec`] and, on success, inserts an [`AuthContext`] into the request
/// extensions. Every failure short-circuits with `401` and a JSON body of the
/// form `{"error": "<message>"}`.
///
/// | Condition | Message |
/// |-----------|---------|
/// | Header missing, not UTF-8 or not `Bearer` | `missing or invalid Authorization header` |
/// | Nothing after `Bearer` | `empty bearer token` |
/// | `exp` in the past | `token expired` |
/// | `nbf` in the future | `token not valid yet` |
/// | Anything else | `invalid token` |
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use axum::{middleware, routing::get, Extension, Router};
/// use ava_shared::auth::{jwt::TokenCodec, middleware::{jwt_auth_middleware, AuthContext}};
///
/// async fn me(Extension(auth): Extension<AuthContext>) -> String {
///     auth.email
/// }
///
/// let codec = Arc::new(TokenCodec::new("your-secret-key-at-least-32-bytes-long"));
/// let app: Router = Router::new()
///     .route("/me", get(me))
///     .layer(middleware::from_fn_with_state(codec, jwt_auth_middleware));
/// ```

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use super::jwt::{JwtError, TokenCodec};
use crate::models::{account::AccountSnapshot, role::Role};

/// Identity of the caller, available to handlers via `Extension<AuthContext>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Raw bearer token as presented
    pub token: String,

    /// Authenticated account ID
    pub account_id: i64,

    /// Account email at token issue time
    pub email: String,

    /// Role at token issue time
    pub role: Role,

    /// Account snapshot carried in the token
    pub account: AccountSnapshot,
}

/// Error type for authentication middleware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Header absent or not a bearer credential
    MissingHeader,

    /// Bearer scheme with no token
    EmptyToken,

    /// Token past its expiry
    Expired,

    /// Token before its not-before time
    NotYetValid,

    /// Signature, algorithm, issuer or format rejected
    InvalidToken,
}

impl AuthError {
    /// Client-facing message
    pub fn message(&self) -> &'static str {
        match self {
            AuthError::MissingHeader => "missing or invalid Authorization header",
            AuthError::EmptyToken => "empty bearer token",
            AuthError::Expired => "token expired",
            AuthError::NotYetValid => "token not valid yet",
            AuthError::InvalidToken => "invalid token",
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::Expired,
            JwtError::NotYetValid => AuthError::NotYetValid,
            JwtError::Invalid(_) | JwtError::Signing(_) => AuthError::InvalidToken,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(json!({ "error": self.message() }))).into_response()
    }
}

/// Extracts the token from an `Authorization` header value
///
/// The scheme must be exactly `Bearer`, followed by nothing or whitespace.
fn bearer_token(header_value: &str) -> Result<&str, AuthError> {
    let rest = header_value
        .strip_prefix("Bearer")
        .ok_or(AuthError::MissingHeader)?;

    if !rest.is_empty() && !rest.starts_with(' ') {
        return Err(AuthError::MissingHeader);
    }

    let token = rest.trim();
    if token.is_empty() {
        return Err(AuthError::EmptyToken);
    }

    Ok(token)
}

/// Bearer token middleware
///
/// Install with `axum::middleware::from_fn_with_state(codec, jwt_auth_middleware)`.
pub async fn jwt_auth_middleware(
    State(codec): State<Arc<TokenCodec>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingHeader)?;

    let token = bearer_token(header_value)?.to_string();

    let claims = codec.decode(&token).map_err(|e| {
        debug!(error = %e, "Rejected bearer token");
        AuthError::from(e)
    })?;

    req.extensions_mut().insert(AuthContext {
        token,
        account_id: claims.sub,
        email: claims.email,
        role: claims.role,
        account: claims.user,
    });

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::account::fixtures;
    use axum::{body::Body, middleware, routing::get, Extension, Router};
    use chrono::Duration;
    use tower::Service;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    async fn whoami(Extension(auth): Extension<AuthContext>) -> String {
        format!("{}:{}:{}", auth.account_id, auth.email, auth.role.name)
    }

    fn app(codec: Arc<TokenCodec>) -> Router {
        Router::new()
            .route("/me", get(whoami))
            .layer(middleware::from_fn_with_state(codec, jwt_auth_middleware))
    }

    async fn send(codec: Arc<TokenCodec>, authorization: Option<&str>) -> (StatusCode, String) {
        let mut builder = axum::http::Request::builder().uri("/me");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let req = builder.body(Body::empty()).unwrap();

        let response = app(codec).call(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn token_for(codec: &TokenCodec, id: i64) -> String {
        let claims = codec.build_claims(&fixtures::account(id, "maria@example.com"));
        codec.encode(&claims).unwrap()
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc"), Ok("abc"));
        assert_eq!(bearer_token("Bearer   abc  "), Ok("abc"));
        assert_eq!(bearer_token("Bearer"), Err(AuthError::EmptyToken));
        assert_eq!(bearer_token("Bearer    "), Err(AuthError::EmptyToken));
        assert_eq!(bearer_token("Bearerabc"), Err(AuthError::MissingHeader));
        assert_eq!(bearer_token("Basic abc"), Err(AuthError::MissingHeader));
        assert_eq!(bearer_token(""), Err(AuthError::MissingHeader));
    }

    #[tokio::test]
    async fn test_valid_token_populates_context() {
        let codec = Arc::new(TokenCodec::new(SECRET));
        let token = token_for(&codec, 42);

        let (status, body) = send(codec, Some(&format!("Bearer {}", token))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "42:maria@example.com:admin");
    }

    #[tokio::test]
    async fn test_missing_header() {
        let (status, body) = send(Arc::new(TokenCodec::new(SECRET)), None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, r#"{"error":"missing or invalid Authorization header"}"#);
    }

    #[tokio::test]
    async fn test_empty_token() {
        let (status, body) = send(Arc::new(TokenCodec::new(SECRET)), Some("Bearer   ")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, r#"{"error":"empty bearer token"}"#);
    }

    #[tokio::test]
    async fn test_expired_token() {
        let expired = TokenCodec::new(SECRET).with_ttl(Duration::seconds(-3600));
        let token = token_for(&expired, 1);

        let (status, body) = send(Arc::new(TokenCodec::new(SECRET)), Some(&format!("Bearer {}", token))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, r#"{"error":"token expired"}"#);
    }

    #[tokio::test]
    async fn test_not_yet_valid_token() {
        let codec = TokenCodec::new(SECRET);
        let mut claims = codec.build_claims(&fixtures::account(1, "maria@example.com"));
        claims.nbf += 3600;
        let token = codec.encode(&claims).unwrap();

        let (status, body) = send(Arc::new(codec), Some(&format!("Bearer {}", token))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, r#"{"error":"token not valid yet"}"#);
    }

    #[tokio::test]
    async fn test_token_signed_with_other_secret() {
        let other = TokenCodec::new("another-secret-key-at-least-32-bytes");
        let token = token_for(&other, 1);

        let (status, body) = send(Arc::new(TokenCodec::new(SECRET)), Some(&format!("Bearer {}", token))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, r#"{"error":"invalid token"}"#);
    }
}
