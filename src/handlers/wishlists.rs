//! Wishlist entries, unique per (customer, product).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::CustomerToken;
use crate::error::{ApiError, ApiResult};
use crate::models::WishlistItem;
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    token: CustomerToken,
    Path(customer_id): Path<Uuid>,
) -> ApiResult<Json<Vec<WishlistItem>>> {
    token.authorize(customer_id)?;
    let items = sqlx::query_as::<_, WishlistItem>(
        "SELECT * FROM wishlist_items WHERE customer_id = $1 ORDER BY created_at DESC",
    )
    .bind(customer_id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(items))
}

#[derive(Debug, Deserialize)]
pub struct AddWishlistRequest {
    pub product_id: Uuid,
}

pub async fn add(
    State(state): State<AppState>,
    token: CustomerToken,
    Path(customer_id): Path<Uuid>,
    Json(req): Json<AddWishlistRequest>,
) -> ApiResult<(StatusCode, Json<WishlistItem>)> {
    token.authorize(customer_id)?;
    let exists: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM products WHERE id = $1 AND status = 'active'")
            .bind(req.product_id)
            .fetch_optional(&state.db)
            .await?;
    if exists.is_none() {
        return Err(ApiError::NotFound("product not found".into()));
    }
    let item = sqlx::query_as::<_, WishlistItem>(
        "INSERT INTO wishlist_items (id, customer_id, product_id, created_at) \
         VALUES ($1, $2, $3, NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(customer_id)
    .bind(req.product_id)
    .fetch_one(&state.db)
    .await
    .map_err(|err| match ApiError::from(err) {
        ApiError::Conflict(_) => ApiError::Conflict("product already in wishlist".into()),
        other => other,
    })?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn remove(
    State(state): State<AppState>,
    token: CustomerToken,
    Path((customer_id, product_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    token.authorize(customer_id)?;
    let result =
        sqlx::query("DELETE FROM wishlist_items WHERE customer_id = $1 AND product_id = $2")
            .bind(customer_id)
            .bind(product_id)
            .execute(&state.db)
            .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("wishlist entry not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
