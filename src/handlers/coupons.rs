//! Coupon administration, validation and redemption.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::AdminToken;
use crate::domain::coupon::{self, KIND_FIXED, KIND_PERCENTAGE};
use crate::error::{ApiError, ApiResult};
use crate::models::Coupon;
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    _admin: AdminToken,
) -> ApiResult<Json<Vec<Coupon>>> {
    let coupons =
        sqlx::query_as::<_, Coupon>("SELECT * FROM coupons ORDER BY created_at DESC")
            .fetch_all(&state.db)
            .await?;
    Ok(Json(coupons))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CouponInput {
    #[validate(length(min = 2, max = 40))]
    pub code: String,
    pub kind: String,
    pub value: Decimal,
    pub min_order_value: Option<Decimal>,
    pub max_discount: Option<Decimal>,
    #[validate(range(min = 1))]
    pub usage_limit: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

impl CouponInput {
    fn check(&self) -> Result<(), ApiError> {
        self.validate()?;
        if self.value <= Decimal::ZERO {
            return Err(ApiError::BadRequest("coupon value must be positive".into()));
        }
        match self.kind.as_str() {
            KIND_PERCENTAGE => {
                if self.value > Decimal::ONE_HUNDRED {
                    return Err(ApiError::BadRequest(
                        "percentage coupons cannot exceed 100".into(),
                    ));
                }
            }
            KIND_FIXED => {}
            other => {
                return Err(ApiError::BadRequest(format!("unknown coupon kind: {other}")));
            }
        }
        Ok(())
    }
}

pub async fn create(
    State(state): State<AppState>,
    _admin: AdminToken,
    Json(input): Json<CouponInput>,
) -> ApiResult<(StatusCode, Json<Coupon>)> {
    input.check()?;
    let coupon = sqlx::query_as::<_, Coupon>(
        "INSERT INTO coupons \
         (id, code, kind, value, min_order_value, max_discount, usage_limit, used_count, \
          expires_at, is_active, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, 0, $8, $9, NOW(), NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(coupon::normalize_code(&input.code))
    .bind(&input.kind)
    .bind(input.value)
    .bind(input.min_order_value)
    .bind(input.max_discount)
    .bind(input.usage_limit)
    .bind(input.expires_at)
    .bind(input.is_active.unwrap_or(true))
    .fetch_one(&state.db)
    .await
    .map_err(|err| match ApiError::from(err) {
        ApiError::Conflict(_) => ApiError::Conflict("coupon code already exists".into()),
        other => other,
    })?;
    Ok((StatusCode::CREATED, Json(coupon)))
}

pub async fn update(
    State(state): State<AppState>,
    _admin: AdminToken,
    Path(id): Path<Uuid>,
    Json(input): Json<CouponInput>,
) -> ApiResult<Json<Coupon>> {
    input.check()?;
    sqlx::query_as::<_, Coupon>(
        "UPDATE coupons SET code = $2, kind = $3, value = $4, min_order_value = $5, \
         max_discount = $6, usage_limit = $7, expires_at = $8, is_active = $9, \
         updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(coupon::normalize_code(&input.code))
    .bind(&input.kind)
    .bind(input.value)
    .bind(input.min_order_value)
    .bind(input.max_discount)
    .bind(input.usage_limit)
    .bind(input.expires_at)
    .bind(input.is_active.unwrap_or(true))
    .fetch_optional(&state.db)
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound("coupon not found".into()))
}

pub async fn remove(
    State(state): State<AppState>,
    _admin: AdminToken,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let result = sqlx::query("DELETE FROM coupons WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("coupon not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub code: String,
    pub order_total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub discount: Decimal,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// `POST /coupons/validate` — dry-run evaluation, no counter increment.
pub async fn validate(
    State(state): State<AppState>,
    Json(req): Json<ValidateRequest>,
) -> ApiResult<Json<ValidateResponse>> {
    let code = coupon::normalize_code(&req.code);
    let found = sqlx::query_as::<_, Coupon>("SELECT * FROM coupons WHERE code = $1")
        .bind(&code)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("unknown coupon code".into()))?;
    let response = match coupon::evaluate(&found, req.order_total, Utc::now()) {
        Ok(discount) => ValidateResponse { valid: true, discount, code, reason: None },
        Err(reason) => ValidateResponse {
            valid: false,
            discount: Decimal::ZERO,
            code,
            reason: Some(reason.to_string()),
        },
    };
    Ok(Json(response))
}

/// Atomically consumes one use of the coupon. The conditional update is the
/// compare-and-swap guard: two concurrent checkouts racing for the last use
/// cannot both succeed.
pub async fn redeem(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    coupon_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE coupons SET used_count = used_count + 1, updated_at = NOW() \
         WHERE id = $1 AND is_active \
         AND (usage_limit IS NULL OR used_count < usage_limit)",
    )
    .bind(coupon_id)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected() == 1)
}
