/// Role endpoints (read-only)
///
/// - `GET /roles` - List roles
/// - `GET /roles/:id` - Show one role

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiPath,
};
use ava_shared::{error::ServiceError, models::role::Role, repository::RepositoryError};
use axum::{extract::State, Json};

/// `GET /roles`
pub async fn list_roles(State(state): State<AppState>) -> ApiResult<Json<Vec<Role>>> {
    let roles = state.roles.list().await.map_err(ServiceError::from)?;
    Ok(Json(roles))
}

/// `GET /roles/:id`
pub async fn get_role(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Json<Role>> {
    match state.roles.get_by_id(id).await {
        Ok(role) => Ok(Json(role)),
        Err(RepositoryError::NotFound) => Err(ApiError::NotFound("role not found".to_string())),
        Err(e) => Err(ServiceError::from(e).into()),
    }
}
