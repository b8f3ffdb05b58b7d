//! Souq E-commerce Backend
//!
//! Bilingual (Arabic-first) storefront backend: product catalog, carts with
//! merge-on-login, checkout with coupon redemption, order lifecycle,
//! wishlists and reviews, backed by PostgreSQL.
//!
//! The pure business rules live in [`domain`]; everything HTTP-facing lives
//! in [`handlers`].

pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod fallback;
pub mod handlers;
pub mod models;
pub mod state;
