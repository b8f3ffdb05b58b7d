//! Cart Merge
//!
//! When a guest authenticates, their session cart is folded into the
//! customer's cart. Lines are identified by `(product_id, selected options)`;
//! on conflict the guest line wins and the customer line is dropped.

use std::collections::HashSet;

use serde_json::Value;

use crate::models::CartItem;

/// Canonical text form of a `selected_options` value, used as part of the
/// cart-line identity. Object keys are sorted so that `{"a":1,"b":2}` and
/// `{"b":2,"a":1}` produce the same key.
pub fn options_key(options: &Value) -> String {
    let mut out = String::new();
    canonicalize(options, &mut out);
    out
}

fn canonicalize(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&format!("{key:?}:"));
                canonicalize(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                canonicalize(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Union of the guest and customer carts, deduplicated by
/// `(product_id, options_key)` with guest lines taking precedence.
/// Idempotent: merging a cart with itself returns the same lines.
pub fn merge(guest: &[CartItem], customer: &[CartItem]) -> Vec<CartItem> {
    let mut seen: HashSet<(uuid::Uuid, &str)> = HashSet::new();
    let mut merged = Vec::with_capacity(guest.len() + customer.len());
    for item in guest.iter().chain(customer) {
        if seen.insert((item.product_id, item.options_key.as_str())) {
            merged.push(item.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn item(cart_key: &str, product: u128, quantity: i32, options: Value) -> CartItem {
        CartItem {
            id: Uuid::new_v4(),
            cart_key: cart_key.into(),
            product_id: Uuid::from_u128(product),
            quantity,
            options_key: options_key(&options),
            selected_options: options,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn guest_line_wins_on_conflict() {
        let guest = vec![item("sess-1", 1, 2, json!({}))];
        let user = vec![item("user-1", 1, 1, json!({})), item("user-1", 2, 1, json!({}))];
        let merged = merge(&guest, &user);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].product_id, Uuid::from_u128(1));
        assert_eq!(merged[0].quantity, 2); // guest quantity kept
        assert_eq!(merged[1].product_id, Uuid::from_u128(2));
    }

    #[test]
    fn merge_is_idempotent() {
        let cart = vec![
            item("user-1", 1, 2, json!({"size": "L"})),
            item("user-1", 2, 1, json!({})),
        ];
        let merged = merge(&cart, &cart);
        assert_eq!(merged.len(), cart.len());
        let twice = merge(&merged, &merged);
        assert_eq!(twice.len(), cart.len());
    }

    #[test]
    fn different_options_are_distinct_lines() {
        let guest = vec![item("sess-1", 1, 1, json!({"size": "L"}))];
        let user = vec![item("user-1", 1, 1, json!({"size": "M"}))];
        assert_eq!(merge(&guest, &user).len(), 2);
    }

    #[test]
    fn options_key_is_order_insensitive() {
        let a = json!({"size": "L", "engraving": "أحمد"});
        let b = json!({"engraving": "أحمد", "size": "L"});
        assert_eq!(options_key(&a), options_key(&b));
        assert_ne!(options_key(&a), options_key(&json!({"size": "M"})));
    }

    #[test]
    fn empty_and_null_options() {
        assert_eq!(options_key(&json!({})), "{}");
        assert_eq!(options_key(&Value::Null), "null");
        assert_ne!(options_key(&json!({})), options_key(&Value::Null));
    }
}
