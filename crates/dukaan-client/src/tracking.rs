//! Locally persisted order history, written after a successful checkout
//! so the shopper can find their order id again without an account.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dukaan_core::cart::{KeyValueStorage, StorageError};
use dukaan_core::{Order, OrderStatus};

/// Storage key holding the most recently placed order.
pub const LAST_ORDER_KEY: &str = "last_order";

fn order_key(order_id: &str) -> String {
    format!("order_{order_id}")
}

/// The slim local record of one placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedOrder {
    pub order_id: String,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub placed_at: DateTime<Utc>,
}

impl From<&Order> for TrackedOrder {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.order_id.clone(),
            status: order.status,
            total_amount: order.total_amount,
            placed_at: order.created_at,
        }
    }
}

/// Records `order` under both its own key and [`LAST_ORDER_KEY`].
///
/// # Errors
///
/// Returns [`StorageError`] if serialization or the storage write fails.
pub fn record<S: KeyValueStorage>(storage: &mut S, order: &Order) -> Result<(), StorageError> {
    let tracked = TrackedOrder::from(order);
    let json = serde_json::to_string(&tracked)?;
    storage.set(&order_key(&tracked.order_id), &json)?;
    storage.set(LAST_ORDER_KEY, &json)
}

/// Looks up one locally recorded order by id.
///
/// # Errors
///
/// Returns [`StorageError`] if the storage read or the parse fails.
pub fn get<S: KeyValueStorage>(
    storage: &S,
    order_id: &str,
) -> Result<Option<TrackedOrder>, StorageError> {
    parse(storage.get(&order_key(order_id))?)
}

/// The most recently placed order, if any.
///
/// # Errors
///
/// Returns [`StorageError`] if the storage read or the parse fails.
pub fn last_order<S: KeyValueStorage>(storage: &S) -> Result<Option<TrackedOrder>, StorageError> {
    parse(storage.get(LAST_ORDER_KEY)?)
}

fn parse(raw: Option<String>) -> Result<Option<TrackedOrder>, StorageError> {
    match raw {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dukaan_core::cart::MemoryStorage;
    use dukaan_core::{PaymentMethod, ShippingInfo, ShippingMethod};

    fn sample_order(order_id: &str) -> Order {
        Order {
            order_id: order_id.to_owned(),
            user_id: "64b0f1c2a9d3e4f5a6b7c8d9".parse().expect("doc id"),
            name: "Asha Rao".to_owned(),
            address: "12 MG Road, Pune, Pune - 411001".to_owned(),
            image: "/mug.png".to_owned(),
            product_name: "Mug".to_owned(),
            items: vec![],
            shipping: ShippingInfo {
                email: "asha@example.com".to_owned(),
                phone: "9999999999".to_owned(),
                first_name: "Asha".to_owned(),
                last_name: "Rao".to_owned(),
                city: "Pune".to_owned(),
                district: "Pune".to_owned(),
                address: "12 MG Road".to_owned(),
                pincode: "411001".to_owned(),
            },
            payment_method: PaymentMethod::Cod,
            shipping_method: ShippingMethod::Regular,
            subtotal: Decimal::from(690),
            shipping_fee: Decimal::from(90),
            discount: Decimal::from(50),
            total_amount: Decimal::from(730),
            status: OrderStatus::Processing,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn record_then_get_round_trips() {
        let mut storage = MemoryStorage::new();
        let order = sample_order("ORD1");
        record(&mut storage, &order).expect("record");

        let tracked = get(&storage, "ORD1").expect("get").expect("present");
        assert_eq!(tracked.order_id, "ORD1");
        assert_eq!(tracked.status, OrderStatus::Processing);
        assert_eq!(tracked.total_amount, Decimal::from(730));
    }

    #[test]
    fn last_order_tracks_the_newest() {
        let mut storage = MemoryStorage::new();
        record(&mut storage, &sample_order("ORD1")).expect("record");
        record(&mut storage, &sample_order("ORD2")).expect("record");

        let last = last_order(&storage).expect("read").expect("present");
        assert_eq!(last.order_id, "ORD2");
        // The first order is still reachable by id.
        assert!(get(&storage, "ORD1").expect("get").is_some());
    }

    #[test]
    fn missing_order_reads_as_none() {
        let storage = MemoryStorage::new();
        assert!(get(&storage, "ORD404").expect("get").is_none());
        assert!(last_order(&storage).expect("read").is_none());
    }
}
