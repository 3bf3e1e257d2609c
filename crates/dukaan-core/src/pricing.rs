//! Checkout pricing policy: shipping fee tiers, coupon codes, and the
//! grand-total computation. All amounts are whole-rupee [`Decimal`]s.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{cart_total, CartItem};

/// How the order ships. Each tier carries a fixed fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShippingMethod {
    Free,
    Regular,
    Express,
}

impl ShippingMethod {
    /// The flat fee for this tier.
    #[must_use]
    pub fn fee(self) -> Decimal {
        match self {
            ShippingMethod::Free => Decimal::ZERO,
            ShippingMethod::Regular => Decimal::from(90),
            ShippingMethod::Express => Decimal::from(320),
        }
    }
}

impl std::fmt::Display for ShippingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShippingMethod::Free => write!(f, "free"),
            ShippingMethod::Regular => write!(f, "regular"),
            ShippingMethod::Express => write!(f, "express"),
        }
    }
}

impl std::str::FromStr for ShippingMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(ShippingMethod::Free),
            "regular" => Ok(ShippingMethod::Regular),
            "express" => Ok(ShippingMethod::Express),
            other => Err(format!("unknown shipping method '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cod,
    Upi,
    Card,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cod => write!(f, "cod"),
            PaymentMethod::Upi => write!(f, "upi"),
            PaymentMethod::Card => write!(f, "card"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cod" => Ok(PaymentMethod::Cod),
            "upi" => Ok(PaymentMethod::Upi),
            "card" => Ok(PaymentMethod::Card),
            other => Err(format!("unknown payment method '{other}'")),
        }
    }
}

/// The fixed coupon table. No percentage coupons, no expiry, no stacking.
const COUPONS: [(&str, i64); 2] = [("SAVE50", 50), ("SAVE100", 100)];

/// Looks up a coupon code, case-insensitively and trimmed.
///
/// Returns the flat discount amount, or `None` for unknown codes —
/// callers reset the discount to zero and surface an invalid-coupon
/// signal.
#[must_use]
pub fn coupon_discount(code: &str) -> Option<Decimal> {
    let normalized = code.trim().to_uppercase();
    COUPONS
        .iter()
        .find(|(c, _)| *c == normalized)
        .map(|&(_, amount)| Decimal::from(amount))
}

/// Returns `true` if `amount` is zero or a value the coupon table can
/// produce. Used server-side to reject fabricated discounts.
#[must_use]
pub fn is_known_discount(amount: Decimal) -> bool {
    amount == Decimal::ZERO || COUPONS.iter().any(|&(_, a)| Decimal::from(a) == amount)
}

/// Shipping fee for `method` given the cart size: always zero for an
/// empty cart regardless of tier.
#[must_use]
pub fn shipping_fee(method: ShippingMethod, item_count: usize) -> Decimal {
    if item_count == 0 {
        Decimal::ZERO
    } else {
        method.fee()
    }
}

/// `max(0, subtotal + shipping_fee - discount)` — floored at zero so an
/// oversized discount can never produce a negative total.
#[must_use]
pub fn grand_total(subtotal: Decimal, shipping_fee: Decimal, discount: Decimal) -> Decimal {
    (subtotal + shipping_fee - discount).max(Decimal::ZERO)
}

/// All derived pricing for one checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub discount: Decimal,
    pub grand_total: Decimal,
}

impl Quote {
    /// Computes the full quote for `items` with the chosen shipping
    /// method and an already-resolved discount amount.
    #[must_use]
    pub fn compute(items: &[CartItem], method: ShippingMethod, discount: Decimal) -> Self {
        let subtotal = cart_total(items);
        let shipping_fee = shipping_fee(method, items.len());
        Self {
            subtotal,
            shipping_fee,
            discount,
            grand_total: grand_total(subtotal, shipping_fee, discount),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: i64, qty: u32) -> CartItem {
        CartItem {
            product_id: "64b0f1c2a9d3e4f5a6b7c8d9".to_owned(),
            title: "Item".to_owned(),
            price: Decimal::from(price),
            old_price: None,
            discount: None,
            image: None,
            category: None,
            qty,
        }
    }

    #[test]
    fn fee_tiers_are_fixed() {
        assert_eq!(ShippingMethod::Free.fee(), Decimal::ZERO);
        assert_eq!(ShippingMethod::Regular.fee(), Decimal::from(90));
        assert_eq!(ShippingMethod::Express.fee(), Decimal::from(320));
    }

    #[test]
    fn empty_cart_ships_for_free_on_every_tier() {
        assert_eq!(shipping_fee(ShippingMethod::Express, 0), Decimal::ZERO);
        assert_eq!(shipping_fee(ShippingMethod::Regular, 0), Decimal::ZERO);
    }

    #[test]
    fn known_coupons_resolve_to_flat_amounts() {
        assert_eq!(coupon_discount("SAVE50"), Some(Decimal::from(50)));
        assert_eq!(coupon_discount("  save100 "), Some(Decimal::from(100)));
    }

    #[test]
    fn unknown_coupon_resolves_to_none() {
        assert_eq!(coupon_discount("BADCODE"), None);
        assert_eq!(coupon_discount(""), None);
    }

    #[test]
    fn grand_total_floors_at_zero() {
        let total = grand_total(Decimal::from(50), Decimal::ZERO, Decimal::from(100));
        assert_eq!(total, Decimal::ZERO);
    }

    #[test]
    fn quote_combines_all_figures() {
        let items = [item(120, 2), item(450, 1)];
        let quote = Quote::compute(&items, ShippingMethod::Regular, Decimal::from(50));
        assert_eq!(quote.subtotal, Decimal::from(690));
        assert_eq!(quote.shipping_fee, Decimal::from(90));
        assert_eq!(quote.discount, Decimal::from(50));
        assert_eq!(quote.grand_total, Decimal::from(730));
    }

    #[test]
    fn known_discount_set_is_closed() {
        assert!(is_known_discount(Decimal::ZERO));
        assert!(is_known_discount(Decimal::from(50)));
        assert!(is_known_discount(Decimal::from(100)));
        assert!(!is_known_discount(Decimal::from(75)));
    }

    #[test]
    fn methods_round_trip_through_strings() {
        for method in ["free", "regular", "express"] {
            let parsed: ShippingMethod = method.parse().expect("parse");
            assert_eq!(parsed.to_string(), method);
        }
        for method in ["cod", "upi", "card"] {
            let parsed: PaymentMethod = method.parse().expect("parse");
            assert_eq!(parsed.to_string(), method);
        }
    }
}
