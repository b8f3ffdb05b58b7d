//! Registration and login for customers, plus the admin login.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{hash_password, issue_token, verify_password, ROLE_ADMIN, ROLE_CUSTOMER};
use crate::error::{ApiError, ApiResult};
use crate::models::{Admin, Customer};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: serde_json::Value,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    pub phone: Option<String>,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;
    let password_hash = hash_password(&req.password)?;
    let customer = sqlx::query_as::<_, Customer>(
        "INSERT INTO customers \
         (id, name, email, phone, address, password_hash, total_orders, total_spent, \
          created_at, updated_at) \
         VALUES ($1, $2, $3, $4, NULL, $5, 0, 0, NOW(), NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&req.name)
    .bind(req.email.to_lowercase())
    .bind(&req.phone)
    .bind(&password_hash)
    .fetch_one(&state.db)
    .await
    .map_err(|err| match ApiError::from(err) {
        ApiError::Conflict(_) => ApiError::Conflict("email already registered".into()),
        other => other,
    })?;
    let token = issue_token(&state.config, &customer.id.to_string(), ROLE_CUSTOMER)?;
    let user = serde_json::to_value(&customer).map_err(|e| ApiError::Internal(e.into()))?;
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;
    // Same error for unknown email and bad password.
    let denied = || ApiError::Unauthorized("invalid email or password".into());
    let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE email = $1")
        .bind(req.email.to_lowercase())
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(denied)?;
    if !verify_password(&customer.password_hash, &req.password) {
        return Err(denied());
    }
    let token = issue_token(&state.config, &customer.id.to_string(), ROLE_CUSTOMER)?;
    let user = serde_json::to_value(&customer).map_err(|e| ApiError::Internal(e.into()))?;
    Ok(Json(AuthResponse { token, user }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdminLoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

pub async fn admin_login(
    State(state): State<AppState>,
    Json(req): Json<AdminLoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;
    let denied = || ApiError::Unauthorized("invalid credentials".into());
    let admin = sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE username = $1")
        .bind(&req.username)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(denied)?;
    if !verify_password(&admin.password_hash, &req.password) {
        return Err(denied());
    }
    let token = issue_token(&state.config, &admin.id.to_string(), ROLE_ADMIN)?;
    Ok(Json(AuthResponse {
        token,
        user: json!({ "id": admin.id, "username": admin.username, "role": admin.role }),
    }))
}
