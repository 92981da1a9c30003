/// Authentication endpoint
///
/// # Endpoint
///
/// ```text
/// POST /auth/login
/// Content-Type: application/json
///
/// { "email": "user@example.com", "password": "correct horse" }
/// ```
///
/// # Response
///
/// ```json
/// { "token": "eyJ..." }
/// ```
///
/// # Errors
///
/// Every failure, including a malformed body, is `422` with a generic
/// `{"error": "..."}` so callers cannot tell unknown emails from wrong
/// passwords.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use ava_shared::error::{AuthFailure, ServiceError};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Signed credential token (24h)
    pub token: String,
}

/// Verifies credentials and returns a token
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, axum::extract::rejection::JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(req) = body.map_err(|e| {
        tracing::debug!(error = %e.body_text(), "Rejected login body");
        ApiError::Unprocessable(AuthFailure::InvalidCredentials.to_string())
    })?;

    req.validate()
        .map_err(|_| ApiError::Unprocessable(AuthFailure::InvalidCredentials.to_string()))?;

    let outcome = state
        .auth
        .login(&req.email, &req.password)
        .await
        .map_err(|e| match e {
            ServiceError::Auth(failure) => ApiError::Unprocessable(failure.to_string()),
            other => ApiError::from(other),
        })?;

    Ok(Json(LoginResponse {
        token: outcome.token,
    }))
}
