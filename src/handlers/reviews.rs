//! Product reviews: one per (customer, product), approval-gated.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AdminToken, CustomerToken};
use crate::error::{ApiError, ApiResult};
use crate::models::Review;
use crate::state::AppState;

/// Public listing: approved reviews only.
pub async fn list_for_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Review>>> {
    let reviews = sqlx::query_as::<_, Review>(
        "SELECT * FROM reviews WHERE product_id = $1 AND is_approved \
         ORDER BY created_at DESC",
    )
    .bind(product_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(reviews))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewInput {
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    token: CustomerToken,
    Path(product_id): Path<Uuid>,
    Json(input): Json<ReviewInput>,
) -> ApiResult<(StatusCode, Json<Review>)> {
    input.validate()?;
    let customer_id = token.customer_id()?;
    let exists: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM products WHERE id = $1 AND status = 'active'")
            .bind(product_id)
            .fetch_optional(&state.db)
            .await?;
    if exists.is_none() {
        return Err(ApiError::NotFound("product not found".into()));
    }
    let review = sqlx::query_as::<_, Review>(
        "INSERT INTO reviews (id, customer_id, product_id, rating, comment, is_approved, created_at) \
         VALUES ($1, $2, $3, $4, $5, FALSE, NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(customer_id)
    .bind(product_id)
    .bind(input.rating)
    .bind(&input.comment)
    .fetch_one(&state.db)
    .await
    .map_err(|err| match ApiError::from(err) {
        ApiError::Conflict(_) => {
            ApiError::Conflict("you have already reviewed this product".into())
        }
        other => other,
    })?;
    Ok((StatusCode::CREATED, Json(review)))
}

#[derive(Debug, Deserialize)]
pub struct ReviewListParams {
    pub approved: Option<bool>,
}

/// Admin listing across all products, optionally filtered by approval.
pub async fn list_all(
    State(state): State<AppState>,
    _admin: AdminToken,
    Query(params): Query<ReviewListParams>,
) -> ApiResult<Json<Vec<Review>>> {
    let reviews = sqlx::query_as::<_, Review>(
        "SELECT * FROM reviews WHERE ($1::bool IS NULL OR is_approved = $1) \
         ORDER BY created_at DESC",
    )
    .bind(params.approved)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(reviews))
}

pub async fn approve(
    State(state): State<AppState>,
    _admin: AdminToken,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Review>> {
    sqlx::query_as::<_, Review>(
        "UPDATE reviews SET is_approved = TRUE WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound("review not found".into()))
}
