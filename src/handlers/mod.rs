//! HTTP resource handlers, one module per noun.

pub mod auth;
pub mod carts;
pub mod categories;
pub mod coupons;
pub mod customers;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod uploads;
pub mod wishlists;

use axum::routing::{get, post, put};
use axum::Router;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub category: Option<Uuid>,
    pub search: Option<String>,
}

impl ListParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit_offset(&self) -> (i64, i64) {
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (self.page() - 1) * per_page;
        (per_page as i64, offset as i64)
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub degraded: bool,
}

impl<T> PaginatedResponse<T> {
    pub fn live(data: Vec<T>, total: i64, page: u32) -> Self {
        Self { data, total, page, degraded: false }
    }

    pub fn degraded(data: Vec<T>) -> Self {
        let total = data.len() as i64;
        Self { data, total, page: 1, degraded: true }
    }
}

/// Unpaginated listing with the degraded-mode flag.
#[derive(Debug, Serialize)]
pub struct Listing<T> {
    pub data: Vec<T>,
    pub degraded: bool,
}

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/:id",
            get(products::get).put(products::update).delete(products::remove),
        )
        .route(
            "/products/:id/reviews",
            get(reviews::list_for_product).post(reviews::create),
        )
        .route("/categories", get(categories::list).post(categories::create))
        .route(
            "/categories/:id",
            get(categories::get).put(categories::update).delete(categories::remove),
        )
        .route("/orders", get(orders::list).post(orders::create))
        .route("/orders/:id", get(orders::get))
        .route("/orders/:id/status", put(orders::transition))
        .route("/coupons", get(coupons::list).post(coupons::create))
        .route("/coupons/:id", put(coupons::update).delete(coupons::remove))
        .route("/coupons/validate", post(coupons::validate))
        .route("/customers", get(customers::list))
        .route("/customers/:id", get(customers::get).put(customers::update))
        .route("/carts/merge", post(carts::merge))
        .route(
            "/carts/:key",
            get(carts::get).post(carts::add_item).delete(carts::clear),
        )
        .route("/carts/:key/items/:product_id", put(carts::update_item))
        .route(
            "/wishlists/:customer_id",
            get(wishlists::list).post(wishlists::add),
        )
        .route(
            "/wishlists/:customer_id/:product_id",
            axum::routing::delete(wishlists::remove),
        )
        .route("/reviews", get(reviews::list_all))
        .route("/reviews/:id/approve", put(reviews::approve))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/admin", post(auth::admin_login))
        .route("/uploads", post(uploads::create))
        .route("/notifications", post(notifications::send))
}
