//! Category CRUD.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AdminToken;
use crate::error::{ApiError, ApiResult};
use crate::fallback;
use crate::handlers::Listing;
use crate::models::Category;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Listing<Category>>> {
    match sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
        .fetch_all(&state.db)
        .await
    {
        Ok(data) => Ok(Json(Listing { data, degraded: false })),
        Err(err) => {
            tracing::warn!(error = %err, "category listing degraded to static catalog");
            Ok(Json(Listing { data: fallback::categories(), degraded: true }))
        }
    }
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Category>> {
    sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("category not found".into()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryInput {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    _admin: AdminToken,
    Json(input): Json<CategoryInput>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    input.validate()?;
    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (id, name, description, image, created_at) \
         VALUES ($1, $2, $3, $4, NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&input.name)
    .bind(&input.description)
    .bind(&input.image)
    .fetch_one(&state.db)
    .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update(
    State(state): State<AppState>,
    _admin: AdminToken,
    Path(id): Path<Uuid>,
    Json(input): Json<CategoryInput>,
) -> ApiResult<Json<Category>> {
    input.validate()?;
    sqlx::query_as::<_, Category>(
        "UPDATE categories SET name = $2, description = $3, image = $4 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&input.name)
    .bind(&input.description)
    .bind(&input.image)
    .fetch_optional(&state.db)
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound("category not found".into()))
}

pub async fn remove(
    State(state): State<AppState>,
    _admin: AdminToken,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("category not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
