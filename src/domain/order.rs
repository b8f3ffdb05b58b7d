//! Order Lifecycle
//!
//! Statuses move forward through pending → confirmed → processing → shipped
//! → delivered; `cancelled` is reachable from any non-terminal state.
//! Stock is captured when an order crosses into `confirmed` and released
//! again when a captured order is cancelled.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "processing" => Some(Self::Processing),
            "shipped" => Some(Self::Shipped),
            "delivered" => Some(Self::Delivered),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Confirmed => 1,
            Self::Processing => 2,
            Self::Shipped => 3,
            Self::Delivered => 4,
            Self::Cancelled => 5,
        }
    }

    /// Forward moves only (skipping intermediate states is allowed);
    /// cancellation from any non-terminal state.
    pub fn can_transition(self, next: Self) -> bool {
        if next == Self::Cancelled {
            return !self.is_terminal();
        }
        !self.is_terminal() && next.rank() > self.rank()
    }

    /// True when this transition first passes the confirmation boundary,
    /// which is the point where line-item stock is decremented.
    pub fn captures_stock(self, next: Self) -> bool {
        self.rank() < Self::Confirmed.rank()
            && next != Self::Cancelled
            && next.rank() >= Self::Confirmed.rank()
            && self.can_transition(next)
    }

    /// True when cancelling an order whose stock was already captured.
    pub fn releases_stock(self, next: Self) -> bool {
        next == Self::Cancelled
            && !self.is_terminal()
            && self.rank() >= Self::Confirmed.rank()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat-rate shipping, waived above the free-shipping threshold.
pub fn shipping_cost(
    subtotal: Decimal,
    flat_rate: Decimal,
    free_over: Option<Decimal>,
) -> Decimal {
    match free_over {
        Some(threshold) if subtotal >= threshold => Decimal::ZERO,
        _ => flat_rate,
    }
}

/// The one total invariant: total = subtotal + shipping − discount.
pub fn order_total(subtotal: Decimal, shipping: Decimal, discount: Decimal) -> Decimal {
    subtotal + shipping - discount
}

#[cfg(test)]
mod tests {
    use super::OrderStatus::*;
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn forward_progression_allowed() {
        assert!(Pending.can_transition(Confirmed));
        assert!(Confirmed.can_transition(Processing));
        assert!(Processing.can_transition(Shipped));
        assert!(Shipped.can_transition(Delivered));
        // Skipping states is a forward move too.
        assert!(Pending.can_transition(Shipped));
    }

    #[test]
    fn backward_and_terminal_moves_rejected() {
        assert!(!Delivered.can_transition(Pending));
        assert!(!Shipped.can_transition(Confirmed));
        assert!(!Cancelled.can_transition(Pending));
        assert!(!Delivered.can_transition(Cancelled));
        assert!(!Cancelled.can_transition(Cancelled));
    }

    #[test]
    fn cancel_reachable_from_any_pre_delivered_state() {
        for from in [Pending, Confirmed, Processing, Shipped] {
            assert!(from.can_transition(Cancelled), "{from} -> cancelled");
        }
    }

    #[test]
    fn stock_captured_at_confirmation_boundary() {
        assert!(Pending.captures_stock(Confirmed));
        assert!(Pending.captures_stock(Shipped));
        assert!(!Confirmed.captures_stock(Processing));
        assert!(!Pending.captures_stock(Cancelled));
    }

    #[test]
    fn stock_released_on_cancel_after_capture() {
        assert!(Confirmed.releases_stock(Cancelled));
        assert!(Shipped.releases_stock(Cancelled));
        assert!(!Pending.releases_stock(Cancelled));
        assert!(!Confirmed.releases_stock(Processing));
    }

    #[test]
    fn status_string_roundtrip() {
        for s in [Pending, Confirmed, Processing, Shipped, Delivered, Cancelled] {
            assert_eq!(OrderStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(OrderStatus::parse("refunded"), None);
    }

    #[test]
    fn shipping_waived_over_threshold() {
        assert_eq!(shipping_cost(dec!(99), dec!(25), Some(dec!(200))), dec!(25));
        assert_eq!(shipping_cost(dec!(200), dec!(25), Some(dec!(200))), dec!(0));
        assert_eq!(shipping_cost(dec!(500), dec!(25), None), dec!(25));
    }

    #[test]
    fn total_invariant() {
        assert_eq!(order_total(dec!(400), dec!(25), dec!(50)), dec!(375));
        assert_eq!(order_total(dec!(20), dec!(0), dec!(20)), dec!(0));
    }
}
