//! Password hashing and bearer-token auth.
//!
//! Credentials are stored as salted argon2 hashes; logins issue signed,
//! expiring JWTs. Admin-gated routes pull [`AdminToken`] out of the request,
//! customer-scoped routes use [`CustomerToken`].

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::error::ApiError;
use crate::state::AppState;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_CUSTOMER: &str = "customer";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: admin or customer id.
    pub sub: String,
    pub role: String,
    pub exp: i64,
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    argon2::hash_encoded(password.as_bytes(), &salt, &argon2::Config::default())
        .map_err(|e| ApiError::Internal(e.into()))
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    argon2::verify_encoded(hash, password.as_bytes()).unwrap_or(false)
}

pub fn issue_token(config: &Config, subject: &str, role: &str) -> Result<String, ApiError> {
    let claims = Claims {
        sub: subject.to_string(),
        role: role.to_string(),
        exp: (Utc::now() + Duration::hours(config.token_ttl_hours)).timestamp(),
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(e.into()))
}

pub fn decode_token(config: &Config, token: &str) -> Result<Claims, ApiError> {
    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized("invalid or expired token".into()))
}

fn bearer_claims(parts: &Parts, state: &AppState) -> Result<Claims, ApiError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("missing authorization header".into()))?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("expected bearer token".into()))?;
    decode_token(&state.config, token)
}

/// Extractor for routes that require the `admin` role.
pub struct AdminToken(pub Claims);

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminToken {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let claims = bearer_claims(parts, state)?;
        if claims.role != ROLE_ADMIN {
            return Err(ApiError::Unauthorized("admin access required".into()));
        }
        Ok(Self(claims))
    }
}

/// Extractor for routes acting on behalf of an authenticated customer.
pub struct CustomerToken(pub Claims);

impl CustomerToken {
    pub fn customer_id(&self) -> Result<Uuid, ApiError> {
        self.0
            .sub
            .parse()
            .map_err(|_| ApiError::Unauthorized("malformed token subject".into()))
    }

    /// Admins may act on any customer; customers only on themselves.
    pub fn authorize(&self, customer_id: Uuid) -> Result<(), ApiError> {
        if self.0.role == ROLE_ADMIN || self.customer_id()? == customer_id {
            Ok(())
        } else {
            Err(ApiError::Unauthorized("not your resource".into()))
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CustomerToken {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        Ok(Self(bearer_claims(parts, state)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_roundtrip() {
        let hash = hash_password("s3cret-pass").unwrap();
        assert!(verify_password(&hash, "s3cret-pass"));
        assert!(!verify_password(&hash, "wrong"));
    }
}
