//! Product catalog CRUD. Listing degrades to the static catalog when the
//! store is unreachable; lookups and mutations never do.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AdminToken;
use crate::error::{ApiError, ApiResult};
use crate::fallback;
use crate::handlers::{ListParams, PaginatedResponse};
use crate::models::Product;
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<PaginatedResponse<Product>>> {
    let page = params.page();
    match fetch_page(&state, &params).await {
        Ok((data, total)) => Ok(Json(PaginatedResponse::live(data, total, page))),
        Err(err) => {
            tracing::warn!(error = %err, "product listing degraded to static catalog");
            Ok(Json(PaginatedResponse::degraded(fallback::products())))
        }
    }
}

async fn fetch_page(
    state: &AppState,
    params: &ListParams,
) -> Result<(Vec<Product>, i64), sqlx::Error> {
    let (limit, offset) = params.limit_offset();
    let data = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE status = 'active' \
         AND ($1::uuid IS NULL OR category_id = $1) \
         AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%') \
         ORDER BY created_at DESC LIMIT $3 OFFSET $4",
    )
    .bind(params.category)
    .bind(&params.search)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db)
    .await?;
    let total: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM products WHERE status = 'active' \
         AND ($1::uuid IS NULL OR category_id = $1) \
         AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%')",
    )
    .bind(params.category)
    .bind(&params.search)
    .fetch_one(&state.db)
    .await?;
    Ok((data, total.0))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Product>> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 AND status <> 'deleted'")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("product not found".into()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProductInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    pub category_id: Uuid,
    pub main_image: Option<String>,
    pub detailed_images: Option<Vec<String>>,
    pub specifications: Option<serde_json::Value>,
    pub dynamic_options: Option<serde_json::Value>,
}

impl ProductInput {
    fn check(&self) -> Result<(), ApiError> {
        self.validate()?;
        if self.price <= Decimal::ZERO {
            return Err(ApiError::BadRequest("price must be positive".into()));
        }
        Ok(())
    }
}

pub async fn create(
    State(state): State<AppState>,
    _admin: AdminToken,
    Json(input): Json<ProductInput>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    input.check()?;
    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO products \
         (id, name, description, price, original_price, stock, category_id, main_image, \
          detailed_images, specifications, dynamic_options, status, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'active', NOW(), NOW()) \
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&input.name)
    .bind(&input.description)
    .bind(input.price)
    .bind(input.original_price)
    .bind(input.stock.unwrap_or(0))
    .bind(input.category_id)
    .bind(&input.main_image)
    .bind(input.detailed_images.clone().unwrap_or_default())
    .bind(input.specifications.clone().unwrap_or_else(|| serde_json::json!([])))
    .bind(input.dynamic_options.clone().unwrap_or_else(|| serde_json::json!([])))
    .fetch_one(&state.db)
    .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update(
    State(state): State<AppState>,
    _admin: AdminToken,
    Path(id): Path<Uuid>,
    Json(input): Json<ProductInput>,
) -> ApiResult<Json<Product>> {
    input.check()?;
    sqlx::query_as::<_, Product>(
        "UPDATE products SET name = $2, description = $3, price = $4, original_price = $5, \
         stock = $6, category_id = $7, main_image = $8, detailed_images = $9, \
         specifications = $10, dynamic_options = $11, updated_at = NOW() \
         WHERE id = $1 AND status <> 'deleted' RETURNING *",
    )
    .bind(id)
    .bind(&input.name)
    .bind(&input.description)
    .bind(input.price)
    .bind(input.original_price)
    .bind(input.stock.unwrap_or(0))
    .bind(input.category_id)
    .bind(&input.main_image)
    .bind(input.detailed_images.clone().unwrap_or_default())
    .bind(input.specifications.clone().unwrap_or_else(|| serde_json::json!([])))
    .bind(input.dynamic_options.clone().unwrap_or_else(|| serde_json::json!([])))
    .fetch_optional(&state.db)
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound("product not found".into()))
}

pub async fn remove(
    State(state): State<AppState>,
    _admin: AdminToken,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let result =
        sqlx::query("UPDATE products SET status = 'deleted', updated_at = NOW() WHERE id = $1 AND status <> 'deleted'")
            .bind(id)
            .execute(&state.db)
            .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("product not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
