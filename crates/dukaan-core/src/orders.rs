//! Order payloads and the order lifecycle.
//!
//! [`OrderDraft`] is the exact JSON body POSTed to the order-creation
//! endpoint; [`Order`] is the persisted shape the server returns.
//! [`OrderStatus`] replaces the original free-string status with a
//! finite-state machine and an explicit transition table.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::DocId;
use crate::pricing::{PaymentMethod, ShippingMethod};

/// Shipping details entered at checkout. All fields are required;
/// presence is the only validation (no email/phone/pincode patterns).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub city: String,
    pub district: String,
    pub address: String,
    pub pincode: String,
}

impl ShippingInfo {
    /// Names of all fields that are empty after trimming.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let fields: [(&'static str, &str); 8] = [
            ("email", &self.email),
            ("phone", &self.phone),
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("city", &self.city),
            ("district", &self.district),
            ("address", &self.address),
            ("pincode", &self.pincode),
        ];
        fields
            .into_iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(name, _)| name)
            .collect()
    }

    /// Display name: first and last name joined, trimmed.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }

    /// One-line delivery address: `street, city, district - pincode`.
    #[must_use]
    pub fn full_address(&self) -> String {
        format!(
            "{}, {}, {} - {}",
            self.address, self.city, self.district, self.pincode
        )
        .trim()
        .to_owned()
    }
}

/// One purchased line item, snapshotted into the order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: DocId,
    pub qty: u32,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub title: String,
}

/// The order-creation request body. `status` and `createdAt` are set by
/// the server, never by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub order_id: String,
    pub user_id: DocId,
    pub items: Vec<OrderItem>,
    pub shipping: ShippingInfo,
    pub payment_method: PaymentMethod,
    pub shipping_method: ShippingMethod,
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub discount: Decimal,
    pub total_amount: Decimal,
}

/// A finalized, persisted purchase request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: String,
    pub user_id: DocId,
    pub name: String,
    pub address: String,
    pub image: String,
    pub product_name: String,
    pub items: Vec<OrderItem>,
    pub shipping: ShippingInfo,
    pub payment_method: PaymentMethod,
    pub shipping_method: ShippingMethod,
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub discount: Decimal,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Order lifecycle states.
///
/// The main line runs `Placed → Processing → Shipped → OutForDelivery →
/// Delivered`; `Cancelled` branches off before shipment and `Refunded`
/// closes either a delivery or a cancellation. Orders created through
/// checkout start in `Processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Placed,
    Processing,
    Shipped,
    OutForDelivery,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// Returns `true` if advancing from `self` to `next` is a legal
    /// transition. Self-transitions are not legal.
    #[must_use]
    pub fn can_transition(self, next: OrderStatus) -> bool {
        use OrderStatus::{
            Cancelled, Delivered, OutForDelivery, Placed, Processing, Refunded, Shipped,
        };
        matches!(
            (self, next),
            (Placed, Processing | Cancelled)
                | (Processing, Shipped | Cancelled)
                | (Shipped, OutForDelivery)
                | (OutForDelivery, Delivered)
                | (Delivered | Cancelled, Refunded)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Placed => "placed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "placed" => Ok(OrderStatus::Placed),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "out_for_delivery" => Ok(OrderStatus::OutForDelivery),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "refunded" => Ok(OrderStatus::Refunded),
            other => Err(format!("unknown order status '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shipping() -> ShippingInfo {
        ShippingInfo {
            email: "a@b.com".to_owned(),
            phone: "9999999999".to_owned(),
            first_name: "Asha".to_owned(),
            last_name: "Rao".to_owned(),
            city: "Pune".to_owned(),
            district: "Pune".to_owned(),
            address: "12 MG Road".to_owned(),
            pincode: "411001".to_owned(),
        }
    }

    #[test]
    fn missing_fields_lists_empty_ones() {
        let mut info = shipping();
        info.phone = "  ".to_owned();
        info.pincode = String::new();
        assert_eq!(info.missing_fields(), vec!["phone", "pincode"]);
    }

    #[test]
    fn full_name_and_address_compose_and_trim() {
        let info = shipping();
        assert_eq!(info.full_name(), "Asha Rao");
        assert_eq!(info.full_address(), "12 MG Road, Pune, Pune - 411001");
    }

    #[test]
    fn main_line_transitions_are_legal() {
        use OrderStatus::{Delivered, OutForDelivery, Placed, Processing, Shipped};
        assert!(Placed.can_transition(Processing));
        assert!(Processing.can_transition(Shipped));
        assert!(Shipped.can_transition(OutForDelivery));
        assert!(OutForDelivery.can_transition(Delivered));
    }

    #[test]
    fn cancel_and_refund_branches() {
        use OrderStatus::{Cancelled, Delivered, Placed, Processing, Refunded};
        assert!(Placed.can_transition(Cancelled));
        assert!(Processing.can_transition(Cancelled));
        assert!(Delivered.can_transition(Refunded));
        assert!(Cancelled.can_transition(Refunded));
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        use OrderStatus::{Delivered, Processing, Refunded, Shipped};
        assert!(!Delivered.can_transition(Processing));
        assert!(!Shipped.can_transition(Processing));
        assert!(!Refunded.can_transition(Processing));
        assert!(!Processing.can_transition(Processing), "no self-loops");
        assert!(!Processing.can_transition(Delivered), "no skipping stages");
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&OrderStatus::OutForDelivery).expect("serialize");
        assert_eq!(json, "\"out_for_delivery\"");
        let parsed: OrderStatus = serde_json::from_str("\"processing\"").expect("parse");
        assert_eq!(parsed, OrderStatus::Processing);
    }

    #[test]
    fn draft_serializes_camel_case() {
        let draft = OrderDraft {
            order_id: "ORD1700000000000".to_owned(),
            user_id: "64b0f1c2a9d3e4f5a6b7c8d9".parse().expect("id"),
            items: vec![OrderItem {
                product_id: "64b0f1c2a9d3e4f5a6b7c8da".parse().expect("id"),
                qty: 2,
                price: Decimal::from(120),
                image: None,
                title: "Mug".to_owned(),
            }],
            shipping: shipping(),
            payment_method: PaymentMethod::Cod,
            shipping_method: ShippingMethod::Regular,
            subtotal: Decimal::from(240),
            shipping_fee: Decimal::from(90),
            discount: Decimal::ZERO,
            total_amount: Decimal::from(330),
        };
        let json = serde_json::to_value(&draft).expect("serialize");
        assert_eq!(json["orderId"], "ORD1700000000000");
        assert_eq!(json["shipping"]["firstName"], "Asha");
        assert_eq!(json["items"][0]["productId"], "64b0f1c2a9d3e4f5a6b7c8da");
        assert_eq!(json["paymentMethod"], "cod");
        assert_eq!(json["shippingMethod"], "regular");
    }
}
