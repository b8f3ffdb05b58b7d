//! Coupon Rules
//!
//! Pure validation and discount computation. Redemption (the usage-counter
//! increment) is a conditional update at the store layer so that concurrent
//! checkouts can never push `used_count` past `usage_limit`; see
//! `handlers::coupons::redeem`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::Coupon;

pub const KIND_PERCENTAGE: &str = "percentage";
pub const KIND_FIXED: &str = "fixed";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponError {
    #[error("coupon is not active")]
    Inactive,

    #[error("coupon has expired")]
    Expired,

    #[error("coupon usage limit reached")]
    UsageExhausted,

    #[error("order total is below the coupon minimum")]
    BelowMinimum,

    #[error("unknown coupon kind: {0}")]
    UnknownKind(String),
}

/// Codes are matched case-insensitively and stored upper-cased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Checks whether `coupon` applies to an order of `order_total` at `now` and
/// returns the discount amount.
///
/// Percentage coupons are clamped to `max_discount` when set; the result is
/// always within `[0, order_total]` so an applied coupon can never drive a
/// total negative.
pub fn evaluate(
    coupon: &Coupon,
    order_total: Decimal,
    now: DateTime<Utc>,
) -> Result<Decimal, CouponError> {
    if !coupon.is_active {
        return Err(CouponError::Inactive);
    }
    if let Some(expires_at) = coupon.expires_at {
        if now >= expires_at {
            return Err(CouponError::Expired);
        }
    }
    if let Some(limit) = coupon.usage_limit {
        if coupon.used_count >= limit {
            return Err(CouponError::UsageExhausted);
        }
    }
    if let Some(min) = coupon.min_order_value {
        if order_total < min {
            return Err(CouponError::BelowMinimum);
        }
    }

    let discount = match coupon.kind.as_str() {
        KIND_PERCENTAGE => {
            let raw = order_total * coupon.value / Decimal::ONE_HUNDRED;
            match coupon.max_discount {
                Some(cap) => raw.min(cap),
                None => raw,
            }
        }
        KIND_FIXED => coupon.value,
        other => return Err(CouponError::UnknownKind(other.to_string())),
    };

    // Round to currency precision so stored amounts stay exact.
    Ok(discount.max(Decimal::ZERO).min(order_total).round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn coupon(kind: &str, value: Decimal) -> Coupon {
        Coupon {
            id: Uuid::new_v4(),
            code: "TEST".into(),
            kind: kind.into(),
            value,
            min_order_value: None,
            max_discount: None,
            usage_limit: None,
            used_count: 0,
            expires_at: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn percentage_clamps_to_max_discount() {
        // SAVE20: 20% of 400 is 80, capped at 50.
        let mut c = coupon(KIND_PERCENTAGE, dec!(20));
        c.code = "SAVE20".into();
        c.max_discount = Some(dec!(50));
        c.min_order_value = Some(dec!(100));
        assert_eq!(evaluate(&c, dec!(400), Utc::now()).unwrap(), dec!(50));
    }

    #[test]
    fn percentage_without_cap() {
        let c = coupon(KIND_PERCENTAGE, dec!(10));
        assert_eq!(evaluate(&c, dec!(250), Utc::now()).unwrap(), dec!(25));
    }

    #[test]
    fn fixed_never_exceeds_order_total() {
        let c = coupon(KIND_FIXED, dec!(30));
        assert_eq!(evaluate(&c, dec!(20), Utc::now()).unwrap(), dec!(20));
        assert_eq!(evaluate(&c, dec!(200), Utc::now()).unwrap(), dec!(30));
    }

    #[test]
    fn discount_never_exceeds_order_total() {
        let cases = [
            coupon(KIND_PERCENTAGE, dec!(100)),
            coupon(KIND_FIXED, dec!(99999)),
        ];
        for c in &cases {
            for total in [dec!(0), dec!(0.01), dec!(15.5), dec!(1000)] {
                let discount = evaluate(c, total, Utc::now()).unwrap();
                assert!(discount <= total);
                assert!(discount >= Decimal::ZERO);
            }
        }
    }

    #[test]
    fn inactive_coupon_rejected() {
        let mut c = coupon(KIND_FIXED, dec!(10));
        c.is_active = false;
        assert_eq!(evaluate(&c, dec!(100), Utc::now()), Err(CouponError::Inactive));
    }

    #[test]
    fn expired_coupon_rejected() {
        let mut c = coupon(KIND_FIXED, dec!(10));
        let now = Utc::now();
        c.expires_at = Some(now - Duration::hours(1));
        assert_eq!(evaluate(&c, dec!(100), now), Err(CouponError::Expired));
        // Boundary: expiry is exclusive, `now == expires_at` is already expired.
        c.expires_at = Some(now);
        assert_eq!(evaluate(&c, dec!(100), now), Err(CouponError::Expired));
    }

    #[test]
    fn exhausted_coupon_rejected() {
        let mut c = coupon(KIND_FIXED, dec!(10));
        c.usage_limit = Some(5);
        c.used_count = 5;
        assert_eq!(
            evaluate(&c, dec!(100), Utc::now()),
            Err(CouponError::UsageExhausted)
        );
    }

    #[test]
    fn below_minimum_rejected() {
        let mut c = coupon(KIND_PERCENTAGE, dec!(20));
        c.min_order_value = Some(dec!(100));
        assert_eq!(
            evaluate(&c, dec!(99.99), Utc::now()),
            Err(CouponError::BelowMinimum)
        );
        assert!(evaluate(&c, dec!(100), Utc::now()).is_ok());
    }

    #[test]
    fn code_normalization() {
        assert_eq!(normalize_code("  save20 "), "SAVE20");
    }
}
