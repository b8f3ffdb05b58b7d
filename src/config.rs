//! Environment-driven runtime configuration.

use anyhow::{Context, Result};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub currency: String,
    pub shipping_flat_rate: Decimal,
    pub free_shipping_threshold: Option<Decimal>,
    pub nats_url: Option<String>,
    pub image_host_url: Option<String>,
    pub image_host_key: Option<String>,
    pub push_gateway_url: Option<String>,
    pub push_gateway_key: Option<String>,
    pub admin_username: String,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: require("DATABASE_URL")?,
            port: optional("PORT")
                .map(|v| v.parse())
                .transpose()
                .context("PORT must be a number")?
                .unwrap_or(8083),
            jwt_secret: require("JWT_SECRET")?,
            token_ttl_hours: optional("TOKEN_TTL_HOURS")
                .map(|v| v.parse())
                .transpose()
                .context("TOKEN_TTL_HOURS must be a number")?
                .unwrap_or(24),
            currency: optional("CURRENCY").unwrap_or_else(|| "SAR".into()),
            shipping_flat_rate: parse_decimal("SHIPPING_FLAT_RATE")?
                .unwrap_or_else(|| Decimal::new(25, 0)),
            free_shipping_threshold: parse_decimal("FREE_SHIPPING_THRESHOLD")?,
            nats_url: optional("NATS_URL"),
            image_host_url: optional("IMAGE_HOST_URL"),
            image_host_key: optional("IMAGE_HOST_KEY"),
            push_gateway_url: optional("PUSH_GATEWAY_URL"),
            push_gateway_key: optional("PUSH_GATEWAY_KEY"),
            admin_username: optional("ADMIN_USERNAME").unwrap_or_else(|| "admin".into()),
            admin_password: optional("ADMIN_PASSWORD"),
        })
    }
}

fn require(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("{name} must be set"))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_decimal(name: &str) -> Result<Option<Decimal>> {
    optional(name)
        .map(|v| v.parse())
        .transpose()
        .with_context(|| format!("{name} must be a decimal amount"))
}
