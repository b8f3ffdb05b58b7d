//! Business rules: coupon evaluation, order lifecycle, cart merging.
//!
//! Everything in here is pure; the handlers own all database access.

pub mod cart;
pub mod coupon;
pub mod order;
