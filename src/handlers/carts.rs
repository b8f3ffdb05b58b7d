//! Cart lines keyed by guest session or customer id, plus merge-on-login.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::domain::cart::{merge as merge_items, options_key};
use crate::error::{ApiError, ApiResult};
use crate::models::CartItem;
use crate::state::AppState;

pub async fn get(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<Vec<CartItem>>> {
    let items = sqlx::query_as::<_, CartItem>(
        "SELECT * FROM cart_items WHERE cart_key = $1 ORDER BY created_at",
    )
    .bind(&key)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(items))
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub selected_options: Option<serde_json::Value>,
}

pub async fn add_item(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<AddItemRequest>,
) -> ApiResult<(StatusCode, Json<CartItem>)> {
    if req.quantity < 1 {
        return Err(ApiError::BadRequest("quantity must be at least 1".into()));
    }
    let exists: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM products WHERE id = $1 AND status = 'active'")
            .bind(req.product_id)
            .fetch_optional(&state.db)
            .await?;
    if exists.is_none() {
        return Err(ApiError::NotFound("product not found".into()));
    }

    let options = req.selected_options.unwrap_or(serde_json::Value::Null);
    let item = sqlx::query_as::<_, CartItem>(
        "INSERT INTO cart_items \
         (id, cart_key, product_id, quantity, selected_options, options_key, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW()) \
         ON CONFLICT (cart_key, product_id, options_key) \
         DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity, updated_at = NOW() \
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&key)
    .bind(req.product_id)
    .bind(req.quantity)
    .bind(&options)
    .bind(options_key(&options))
    .fetch_one(&state.db)
    .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i32,
    /// When present, only the line with these exact options is touched;
    /// otherwise every line of the product.
    pub selected_options: Option<serde_json::Value>,
}

pub async fn update_item(
    State(state): State<AppState>,
    Path((key, product_id)): Path<(String, Uuid)>,
    Json(req): Json<UpdateItemRequest>,
) -> ApiResult<StatusCode> {
    if req.quantity < 0 {
        return Err(ApiError::BadRequest("quantity cannot be negative".into()));
    }
    let target_key = req.selected_options.as_ref().map(options_key);
    let result = if req.quantity == 0 {
        sqlx::query(
            "DELETE FROM cart_items WHERE cart_key = $1 AND product_id = $2 \
             AND ($3::text IS NULL OR options_key = $3)",
        )
        .bind(&key)
        .bind(product_id)
        .bind(&target_key)
        .execute(&state.db)
        .await?
    } else {
        sqlx::query(
            "UPDATE cart_items SET quantity = $4, updated_at = NOW() \
             WHERE cart_key = $1 AND product_id = $2 \
             AND ($3::text IS NULL OR options_key = $3)",
        )
        .bind(&key)
        .bind(product_id)
        .bind(&target_key)
        .bind(req.quantity)
        .execute(&state.db)
        .await?
    };
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("cart item not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<StatusCode> {
    sqlx::query("DELETE FROM cart_items WHERE cart_key = $1")
        .bind(&key)
        .execute(&state.db)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, Validate)]
pub struct MergeRequest {
    #[validate(length(min = 1))]
    pub session_id: String,
    pub customer_id: Uuid,
}

/// Folds a guest cart into the customer's cart on login: both carts are
/// read, merged (guest lines win on identity conflicts) and rewritten as the
/// customer's sole cart; the guest cart is deleted. One transaction.
pub async fn merge(
    State(state): State<AppState>,
    Json(req): Json<MergeRequest>,
) -> ApiResult<Json<Vec<CartItem>>> {
    req.validate()?;
    let customer_key = req.customer_id.to_string();
    if req.session_id == customer_key {
        return Err(ApiError::BadRequest("cannot merge a cart into itself".into()));
    }

    let mut tx = state.db.begin().await?;

    let guest = sqlx::query_as::<_, CartItem>(
        "SELECT * FROM cart_items WHERE cart_key = $1 ORDER BY created_at",
    )
    .bind(&req.session_id)
    .fetch_all(&mut *tx)
    .await?;
    let existing = sqlx::query_as::<_, CartItem>(
        "SELECT * FROM cart_items WHERE cart_key = $1 ORDER BY created_at",
    )
    .bind(&customer_key)
    .fetch_all(&mut *tx)
    .await?;

    let merged = merge_items(&guest, &existing);

    sqlx::query("DELETE FROM cart_items WHERE cart_key = $1 OR cart_key = $2")
        .bind(&req.session_id)
        .bind(&customer_key)
        .execute(&mut *tx)
        .await?;

    let mut result = Vec::with_capacity(merged.len());
    for line in &merged {
        let inserted = sqlx::query_as::<_, CartItem>(
            "INSERT INTO cart_items \
             (id, cart_key, product_id, quantity, selected_options, options_key, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, NOW()) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&customer_key)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(&line.selected_options)
        .bind(&line.options_key)
        .bind(line.created_at)
        .fetch_one(&mut *tx)
        .await?;
        result.push(inserted);
    }

    tx.commit().await?;
    Ok(Json(result))
}
