//! Static catalog served when the store is unreachable.
//!
//! Listing endpoints fall back to this fixed dataset with an explicit
//! `degraded` flag so callers can tell it apart from live data. Lookups and
//! mutations never use it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use crate::models::{Category, Product};

fn epoch() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

pub fn categories() -> Vec<Category> {
    vec![
        Category {
            id: Uuid::from_u128(0xA1),
            name: "عطور | Perfumes".into(),
            description: Some("عطور شرقية وغربية".into()),
            image: None,
            created_at: epoch(),
        },
        Category {
            id: Uuid::from_u128(0xA2),
            name: "هدايا | Gifts".into(),
            description: Some("هدايا مع نقش مخصص".into()),
            image: None,
            created_at: epoch(),
        },
    ]
}

pub fn products() -> Vec<Product> {
    let ts = epoch();
    vec![
        Product {
            id: Uuid::from_u128(0xB1),
            name: "عود ملكي | Royal Oud".into(),
            description: Some("دهن عود فاخر 12 مل".into()),
            price: Decimal::new(34900, 2),
            original_price: Some(Decimal::new(39900, 2)),
            stock: 10,
            category_id: Some(Uuid::from_u128(0xA1)),
            main_image: None,
            detailed_images: vec![],
            specifications: json!([{ "name": "الحجم", "value": "12ml" }]),
            dynamic_options: json!([]),
            status: "active".into(),
            created_at: ts,
            updated_at: ts,
        },
        Product {
            id: Uuid::from_u128(0xB2),
            name: "مسك أبيض | White Musk".into(),
            description: Some("مسك فاخر للجسم".into()),
            price: Decimal::new(8900, 2),
            original_price: None,
            stock: 25,
            category_id: Some(Uuid::from_u128(0xA1)),
            main_image: None,
            detailed_images: vec![],
            specifications: json!([]),
            dynamic_options: json!([]),
            status: "active".into(),
            created_at: ts,
            updated_at: ts,
        },
        Product {
            id: Uuid::from_u128(0xB3),
            name: "صندوق هدية | Gift Box".into(),
            description: Some("صندوق هدية مع نقش اسم حسب الطلب".into()),
            price: Decimal::new(12000, 2),
            original_price: None,
            stock: 8,
            category_id: Some(Uuid::from_u128(0xA2)),
            main_image: None,
            detailed_images: vec![],
            specifications: json!([]),
            dynamic_options: json!([{ "name": "engraving", "type": "text" }]),
            status: "active".into(),
            created_at: ts,
            updated_at: ts,
        },
    ]
}
