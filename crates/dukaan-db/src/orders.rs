//! Database operations for the `orders` table.
//!
//! `items` and `shipping` are stored as JSONB snapshots in the shape the
//! wire contract uses, so a row converts back to a domain
//! [`Order`](dukaan_core::Order) without a join.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use dukaan_core::{Order, OrderItem, OrderStatus, ShippingInfo};

use crate::DbError;

const ORDER_COLUMNS: &str = "id, order_id, user_id, name, address, image, product_name, items, \
     shipping, payment_method, shipping_method, subtotal, shipping_fee, discount, total_amount, \
     status, created_at, updated_at";

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `orders` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub order_id: String,
    pub user_id: String,
    pub name: String,
    pub address: String,
    pub image: String,
    pub product_name: String,
    pub items: serde_json::Value,
    pub shipping: serde_json::Value,
    pub payment_method: String,
    pub shipping_method: String,
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub discount: Decimal,
    pub total_amount: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRow {
    /// Converts the row into the domain [`Order`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError::CorruptRow`] if a JSONB snapshot or an enum
    /// column no longer parses — possible only if the row was written
    /// outside this crate.
    pub fn into_order(self) -> Result<Order, DbError> {
        let corrupt = |reason: String| DbError::CorruptRow {
            entity: "order",
            id: self.order_id.clone(),
            reason,
        };

        let items: Vec<OrderItem> =
            serde_json::from_value(self.items.clone()).map_err(|e| corrupt(e.to_string()))?;
        let shipping: ShippingInfo =
            serde_json::from_value(self.shipping.clone()).map_err(|e| corrupt(e.to_string()))?;
        let payment_method = self.payment_method.parse().map_err(|e| corrupt(e))?;
        let shipping_method = self.shipping_method.parse().map_err(|e| corrupt(e))?;
        let status: OrderStatus = self.status.parse().map_err(|e| corrupt(e))?;
        let user_id = self
            .user_id
            .trim()
            .parse()
            .map_err(|e: dukaan_core::ids::IdError| corrupt(e.to_string()))?;

        Ok(Order {
            order_id: self.order_id,
            user_id,
            name: self.name,
            address: self.address,
            image: self.image,
            product_name: self.product_name,
            items,
            shipping,
            payment_method,
            shipping_method,
            subtotal: self.subtotal,
            shipping_fee: self.shipping_fee,
            discount: self.discount,
            total_amount: self.total_amount,
            status,
            created_at: self.created_at,
        })
    }
}

/// A fully validated order ready for insertion. Status is always
/// `processing` at creation; the state machine advances it later.
#[derive(Debug)]
pub struct NewOrder<'a> {
    pub order_id: &'a str,
    pub user_id: &'a str,
    pub name: &'a str,
    pub address: &'a str,
    pub image: &'a str,
    pub product_name: &'a str,
    pub items: &'a [OrderItem],
    pub shipping: &'a ShippingInfo,
    pub payment_method: dukaan_core::PaymentMethod,
    pub shipping_method: dukaan_core::ShippingMethod,
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub discount: Decimal,
    pub total_amount: Decimal,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Inserts one order with status `processing` and returns the saved row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails; a duplicate `order_id`
/// surfaces as a unique violation (check [`DbError::is_unique_violation`]).
pub async fn insert_order(pool: &PgPool, new: &NewOrder<'_>) -> Result<OrderRow, DbError> {
    let items = serde_json::to_value(new.items).map_err(|e| DbError::CorruptRow {
        entity: "order",
        id: new.order_id.to_owned(),
        reason: e.to_string(),
    })?;
    let shipping = serde_json::to_value(new.shipping).map_err(|e| DbError::CorruptRow {
        entity: "order",
        id: new.order_id.to_owned(),
        reason: e.to_string(),
    })?;

    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "INSERT INTO orders \
           (order_id, user_id, name, address, image, product_name, items, shipping, \
            payment_method, shipping_method, subtotal, shipping_fee, discount, total_amount, status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7::jsonb, $8::jsonb, $9, $10, $11, $12, $13, $14, 'processing') \
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(new.order_id)
    .bind(new.user_id)
    .bind(new.name)
    .bind(new.address)
    .bind(new.image)
    .bind(new.product_name)
    .bind(items)
    .bind(shipping)
    .bind(new.payment_method.to_string())
    .bind(new.shipping_method.to_string())
    .bind(new.subtotal)
    .bind(new.shipping_fee)
    .bind(new.discount)
    .bind(new.total_amount)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns all orders, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_orders(pool: &PgPool) -> Result<Vec<OrderRow>, DbError> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single order by its public `order_id`, or `None`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_order_by_order_id(
    pool: &PgPool,
    order_id: &str,
) -> Result<Option<OrderRow>, DbError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = $1"
    ))
    .bind(order_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Advances an order's status from `from` to `to` in one guarded update.
///
/// The `status = $2` guard makes the transition check race-free: if a
/// concurrent update already moved the order on, no row matches and
/// `None` is returned.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn update_order_status(
    pool: &PgPool,
    order_id: &str,
    from: dukaan_core::OrderStatus,
    to: dukaan_core::OrderStatus,
) -> Result<Option<OrderRow>, DbError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "UPDATE orders SET status = $3, updated_at = NOW() \
         WHERE order_id = $1 AND status = $2 \
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(order_id)
    .bind(from.to_string())
    .bind(to.to_string())
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
