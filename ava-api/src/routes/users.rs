/// Account endpoints
///
/// All routes require a bearer token.
///
/// # Endpoints
///
/// - `GET    /users` - List accounts
/// - `POST   /users` - Provision an account (201 with the account)
/// - `GET    /users/:id` - Show one account
/// - `PATCH  /users/:id` - Partial update
/// - `DELETE /users/:id` - Deactivate (204)
/// - `PATCH  /users/:id/reactivate` - Reactivate (204)
///
/// Accounts are rendered joined with their role and address; the password
/// hash is never serialized.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    extract::{ApiJson, ApiPath},
};
use ava_shared::{
    auth::middleware::AuthContext,
    models::account::Account,
    services::{AddressInput, CreateAccountInput, UpdateAccountInput},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

/// Caller-supplied address fields
#[derive(Debug, Deserialize, Validate)]
pub struct AddressRequest {
    /// `01001000` or `01001-000`
    #[validate(length(min = 8, max = 9, message = "postal code must have 8 digits"))]
    pub postal_code: String,

    pub complement: Option<String>,

    pub number: Option<String>,
}

impl From<AddressRequest> for AddressInput {
    fn from(req: AddressRequest) -> Self {
        Self {
            postal_code: req.postal_code,
            complement: req.complement,
            number: req.number,
        }
    }
}

/// Create account request
///
/// ```json
/// {
///   "name": "Maria Souza",
///   "email": "maria@example.com",
///   "phone": "11999990000",
///   "password": "correct horse",
///   "password_confirm": "correct horse",
///   "address": { "postal_code": "01001-000", "number": "100" },
///   "role_id": 1
/// }
/// ```
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 255, message = "name is required"))]
    pub name: String,

    #[validate(email(message = "invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, max = 32, message = "phone is required"))]
    pub phone: String,

    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,

    #[validate(must_match(other = "password", message = "password confirmation does not match"))]
    pub password_confirm: String,

    pub address: AddressRequest,

    pub role_id: i64,
}

/// Partial update request; absent fields are left untouched
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 255, message = "name must not be empty"))]
    pub name: Option<String>,

    #[validate(email(message = "invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 32, message = "phone must not be empty"))]
    pub phone: Option<String>,

    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: Option<String>,

    pub password_confirm: Option<String>,

    pub address: Option<AddressRequest>,

    pub role_id: Option<i64>,
}

fn reject_blank(field: &str, value: Option<&str>) -> ApiResult<()> {
    match value {
        Some(v) if v.trim().is_empty() => Err(ApiError::ValidationError(vec![ValidationErrorDetail {
            field: field.to_string(),
            message: format!("{} must not be blank", field),
        }])),
        _ => Ok(()),
    }
}

/// `GET /users`
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<Account>>> {
    Ok(Json(state.accounts.list().await?))
}

/// `POST /users`
pub async fn create_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<Account>)> {
    req.validate()?;
    req.address.validate()?;
    reject_blank("name", Some(req.name.as_str()))?;

    let account = state
        .accounts
        .create_account(CreateAccountInput {
            name: req.name.trim().to_string(),
            email: req.email,
            phone: req.phone,
            password: req.password,
            password_confirmation: req.password_confirm,
            address: req.address.into(),
            role_id: req.role_id,
        })
        .await?;

    info!(account_id = account.id, created_by = auth.account_id, "Account created via API");
    Ok((StatusCode::CREATED, Json(account)))
}

/// `GET /users/:id`
pub async fn get_user(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Json<Account>> {
    Ok(Json(state.accounts.get(id).await?))
}

/// `PATCH /users/:id`
pub async fn update_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> ApiResult<Json<Account>> {
    req.validate()?;
    if let Some(address) = &req.address {
        address.validate()?;
    }
    reject_blank("name", req.name.as_deref())?;

    let account = state
        .accounts
        .update_account(
            id,
            UpdateAccountInput {
                name: req.name.map(|n| n.trim().to_string()),
                email: req.email,
                phone: req.phone,
                password: req.password,
                password_confirmation: req.password_confirm,
                address: req.address.map(AddressInput::from),
                role_id: req.role_id,
            },
        )
        .await?;

    Ok(Json(account))
}

/// `DELETE /users/:id`
pub async fn deactivate_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    state.accounts.deactivate(id).await?;
    info!(account_id = id, by = auth.account_id, "Account deactivated via API");
    Ok(StatusCode::NO_CONTENT)
}

/// `PATCH /users/:id/reactivate`
pub async fn reactivate_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    state.accounts.reactivate(id).await?;
    info!(account_id = id, by = auth.account_id, "Account reactivated via API");
    Ok(StatusCode::NO_CONTENT)
}
