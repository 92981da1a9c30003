/// Class endpoints
///
/// - `GET    /classes` - List classes
/// - `POST   /classes` - Create (201)
/// - `GET    /classes/:id` - Show one class
/// - `PATCH  /classes/:id` - Replace name, dates and image
/// - `DELETE /classes/:id` - Delete (204)
///
/// Dates are ISO-8601 (`2024-02-01`).

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiJson, ApiPath},
};
use ava_shared::models::class::{Class, ClassInput};
use axum::{extract::State, http::StatusCode, Json};
use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

/// Create or update request
#[derive(Debug, Deserialize, Validate)]
pub struct ClassRequest {
    #[validate(length(min = 1, max = 255, message = "class name is required"))]
    pub name: String,

    pub start_date: NaiveDate,

    pub final_date: NaiveDate,

    #[validate(length(max = 512, message = "image reference is too long"))]
    pub img_class: Option<String>,
}

impl From<ClassRequest> for ClassInput {
    fn from(req: ClassRequest) -> Self {
        Self {
            name: req.name,
            start_date: req.start_date,
            final_date: req.final_date,
            img_class: req.img_class,
        }
    }
}

/// `GET /classes`
pub async fn list_classes(State(state): State<AppState>) -> ApiResult<Json<Vec<Class>>> {
    Ok(Json(state.classes.list().await?))
}

/// `POST /classes`
pub async fn create_class(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ClassRequest>,
) -> ApiResult<(StatusCode, Json<Class>)> {
    req.validate()?;
    let class = state.classes.create(req.into()).await?;
    Ok((StatusCode::CREATED, Json(class)))
}

/// `GET /classes/:id`
pub async fn get_class(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Json<Class>> {
    Ok(Json(state.classes.get(id).await?))
}

/// `PATCH /classes/:id`
pub async fn update_class(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<ClassRequest>,
) -> ApiResult<Json<Class>> {
    req.validate()?;
    Ok(Json(state.classes.update(id, req.into()).await?))
}

/// `DELETE /classes/:id`
pub async fn delete_class(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<StatusCode> {
    state.classes.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
