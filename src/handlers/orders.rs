//! Order creation and lifecycle transitions.
//!
//! Creation prices every line from the store (client-sent totals are
//! ignored), applies an optional coupon through the atomic redeem, and
//! writes the order, its items and the customer aggregates in a single
//! transaction.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AdminToken;
use crate::domain::coupon;
use crate::domain::order::{order_total, shipping_cost, OrderStatus};
use crate::error::{ApiError, ApiResult};
use crate::events;
use crate::handlers::customers::recompute_stats;
use crate::handlers::{coupons, PaginatedResponse};
use crate::models::{Coupon, Order, OrderItem, Product};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Deserialize)]
pub struct OrderListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    _admin: AdminToken,
    Query(params): Query<OrderListParams>,
) -> ApiResult<Json<PaginatedResponse<Order>>> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(20).clamp(1, 100);
    if let Some(status) = &params.status {
        if OrderStatus::parse(status).is_none() {
            return Err(ApiError::BadRequest(format!("unknown status: {status}")));
        }
    }
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE ($1::text IS NULL OR status = $1) \
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(&params.status)
    .bind(per_page as i64)
    .bind(((page - 1) * per_page) as i64)
    .fetch_all(&state.db)
    .await?;
    let total: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM orders WHERE ($1::text IS NULL OR status = $1)")
            .bind(&params.status)
            .fetch_one(&state.db)
            .await?;
    Ok(Json(PaginatedResponse::live(orders, total.0, page)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<OrderWithItems>> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("order not found".into()))?;
    let items = sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = $1")
        .bind(id)
        .fetch_all(&state.db)
        .await?;
    Ok(Json(OrderWithItems { order, items }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
    pub selected_options: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub customer_id: Option<Uuid>,
    #[validate(length(min = 1, max = 120))]
    pub customer_name: String,
    #[validate(email)]
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_address: serde_json::Value,
    #[validate(length(min = 1))]
    pub items: Vec<OrderItemInput>,
    pub payment_method: Option<String>,
    pub coupon_code: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<OrderWithItems>)> {
    req.validate()?;
    for line in &req.items {
        if line.quantity < 1 {
            return Err(ApiError::BadRequest("quantity must be at least 1".into()));
        }
    }

    let mut tx = state.db.begin().await?;

    let ids: Vec<Uuid> = req.items.iter().map(|l| l.product_id).collect();
    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE id = ANY($1) AND status = 'active'",
    )
    .bind(&ids)
    .fetch_all(&mut *tx)
    .await?;
    let by_id: HashMap<Uuid, &Product> = products.iter().map(|p| (p.id, p)).collect();

    let mut subtotal = Decimal::ZERO;
    for line in &req.items {
        let product = by_id
            .get(&line.product_id)
            .ok_or_else(|| ApiError::NotFound(format!("product {} not found", line.product_id)))?;
        subtotal += product.price * Decimal::from(line.quantity);
    }

    let shipping = shipping_cost(
        subtotal,
        state.config.shipping_flat_rate,
        state.config.free_shipping_threshold,
    )
    .round_dp(2);

    let mut discount = Decimal::ZERO;
    let mut applied_code: Option<String> = None;
    if let Some(raw_code) = &req.coupon_code {
        let code = coupon::normalize_code(raw_code);
        let found = sqlx::query_as::<_, Coupon>("SELECT * FROM coupons WHERE code = $1")
            .bind(&code)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::NotFound("unknown coupon code".into()))?;
        discount = coupon::evaluate(&found, subtotal, Utc::now())
            .map_err(|reason| ApiError::BadRequest(reason.to_string()))?;
        if !coupons::redeem(&mut tx, found.id).await? {
            // Lost the race for the last remaining use.
            return Err(ApiError::Conflict("coupon usage limit reached".into()));
        }
        applied_code = Some(code);
    }

    let total = order_total(subtotal, shipping, discount);
    let order_number = format!("ORD-{:08}", rand::random::<u32>());
    let order = sqlx::query_as::<_, Order>(
        "INSERT INTO orders \
         (id, order_number, customer_id, customer_name, customer_email, customer_phone, \
          shipping_address, subtotal, shipping_cost, coupon_code, coupon_discount, total, \
          status, payment_method, payment_status, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 'pending', $13, 'pending', \
          NOW(), NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&order_number)
    .bind(req.customer_id)
    .bind(&req.customer_name)
    .bind(&req.customer_email)
    .bind(&req.customer_phone)
    .bind(&req.shipping_address)
    .bind(subtotal)
    .bind(shipping)
    .bind(&applied_code)
    .bind(discount)
    .bind(total)
    .bind(req.payment_method.as_deref().unwrap_or("cod"))
    .fetch_one(&mut *tx)
    .await?;

    let mut items = Vec::with_capacity(req.items.len());
    for line in &req.items {
        let product = by_id[&line.product_id];
        let item = sqlx::query_as::<_, OrderItem>(
            "INSERT INTO order_items \
             (id, order_id, product_id, product_name, quantity, unit_price, selected_options) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(order.id)
        .bind(product.id)
        .bind(&product.name)
        .bind(line.quantity)
        .bind(product.price)
        .bind(line.selected_options.clone().unwrap_or(serde_json::Value::Null))
        .fetch_one(&mut *tx)
        .await?;
        items.push(item);
    }

    if let Some(customer_id) = req.customer_id {
        recompute_stats(&mut tx, customer_id).await?;
    }

    tx.commit().await?;

    events::publish(
        &state,
        events::ORDER_CREATED,
        &json!({
            "order_id": order.id,
            "order_number": order.order_number,
            "total": order.total,
            "currency": state.config.currency,
        }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(OrderWithItems { order, items })))
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: String,
}

pub async fn transition(
    State(state): State<AppState>,
    _admin: AdminToken,
    Path(id): Path<Uuid>,
    Json(req): Json<TransitionRequest>,
) -> ApiResult<Json<Order>> {
    let next = OrderStatus::parse(&req.status)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown status: {}", req.status)))?;

    let mut tx = state.db.begin().await?;

    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound("order not found".into()))?;
    let current = OrderStatus::parse(&order.status).ok_or_else(|| {
        ApiError::Internal(anyhow::anyhow!("order {id} has corrupt status {}", order.status))
    })?;

    if !current.can_transition(next) {
        return Err(ApiError::Conflict(format!(
            "cannot move order from {current} to {next}"
        )));
    }

    if current.captures_stock(next) || current.releases_stock(next) {
        let items =
            sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;
        if current.captures_stock(next) {
            for item in &items {
                let result = sqlx::query(
                    "UPDATE products SET stock = stock - $2, updated_at = NOW() \
                     WHERE id = $1 AND stock >= $2",
                )
                .bind(item.product_id)
                .bind(item.quantity)
                .execute(&mut *tx)
                .await?;
                if result.rows_affected() == 0 {
                    return Err(ApiError::Conflict(format!(
                        "insufficient stock for {}",
                        item.product_name
                    )));
                }
            }
        } else {
            for item in &items {
                sqlx::query(
                    "UPDATE products SET stock = stock + $2, updated_at = NOW() WHERE id = $1",
                )
                .bind(item.product_id)
                .bind(item.quantity)
                .execute(&mut *tx)
                .await?;
            }
        }
    }

    let updated = sqlx::query_as::<_, Order>(
        "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(next.as_str())
    .fetch_one(&mut *tx)
    .await?;

    if let Some(customer_id) = updated.customer_id {
        recompute_stats(&mut tx, customer_id).await?;
    }

    tx.commit().await?;

    events::publish(
        &state,
        events::ORDER_STATUS_CHANGED,
        &json!({
            "order_id": updated.id,
            "from": current.as_str(),
            "to": next.as_str(),
        }),
    )
    .await;

    Ok(Json(updated))
}
