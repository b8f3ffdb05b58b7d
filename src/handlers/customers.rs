//! Customer profiles and their denormalized order aggregates.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AdminToken, CustomerToken};
use crate::error::{ApiError, ApiResult};
use crate::handlers::{ListParams, PaginatedResponse};
use crate::models::Customer;
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    _admin: AdminToken,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<PaginatedResponse<Customer>>> {
    let page = params.page();
    let (limit, offset) = params.limit_offset();
    let customers = sqlx::query_as::<_, Customer>(
        "SELECT * FROM customers \
         WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%' OR email ILIKE '%' || $1 || '%') \
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(&params.search)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db)
    .await?;
    let total: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM customers \
         WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%' OR email ILIKE '%' || $1 || '%')",
    )
    .bind(&params.search)
    .fetch_one(&state.db)
    .await?;
    Ok(Json(PaginatedResponse::live(customers, total.0, page)))
}

pub async fn get(
    State(state): State<AppState>,
    token: CustomerToken,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Customer>> {
    token.authorize(id)?;
    sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("customer not found".into()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CustomerUpdate {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

pub async fn update(
    State(state): State<AppState>,
    token: CustomerToken,
    Path(id): Path<Uuid>,
    Json(input): Json<CustomerUpdate>,
) -> ApiResult<Json<Customer>> {
    token.authorize(id)?;
    input.validate()?;
    sqlx::query_as::<_, Customer>(
        "UPDATE customers SET name = $2, phone = $3, address = $4, updated_at = NOW() \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&input.name)
    .bind(&input.phone)
    .bind(&input.address)
    .fetch_optional(&state.db)
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound("customer not found".into()))
}

/// Recomputes `total_orders` / `total_spent` from the orders table. Run
/// inside the transaction that changed the order so the aggregates can never
/// drift from the source rows. Cancelled orders do not count.
pub async fn recompute_stats(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    customer_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE customers c SET total_orders = s.cnt, total_spent = s.amount, updated_at = NOW() \
         FROM (SELECT COUNT(*) AS cnt, COALESCE(SUM(total), 0) AS amount \
               FROM orders WHERE customer_id = $1 AND status <> 'cancelled') s \
         WHERE c.id = $1",
    )
    .bind(customer_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
