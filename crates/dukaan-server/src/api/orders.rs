//! Order endpoints: creation with server-side repricing, listing,
//! tracking lookup, and status advancement.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dukaan_core::{
    ids::DocId, pricing, Order, OrderItem, OrderStatus, PaymentMethod, ShippingInfo,
    ShippingMethod,
};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, AppState};

/// Allowed drift between the client-submitted total and the server's
/// recomputation. Amounts are whole rupees, so one paisa of slack only
/// absorbs float round-tripping.
const TOTAL_TOLERANCE: (i64, u32) = (1, 2); // 0.01

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// The order-creation body, deserialized loosely so each missing or
/// malformed field gets its own validation message instead of a generic
/// JSON rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreateOrderRequest {
    #[serde(default)]
    order_id: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    items: Vec<RawOrderItem>,
    #[serde(default)]
    shipping: Option<RawShipping>,
    #[serde(default)]
    payment_method: Option<String>,
    #[serde(default)]
    shipping_method: Option<String>,
    #[serde(default)]
    discount: Option<Decimal>,
    #[serde(default)]
    total_amount: Option<Decimal>,
    // Client-side subtotal and shippingFee are accepted but recomputed
    // from authoritative data; only totalAmount is cross-checked.
    #[serde(default)]
    #[allow(dead_code)]
    subtotal: Option<Decimal>,
    #[serde(default)]
    #[allow(dead_code)]
    shipping_fee: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOrderItem {
    #[serde(default)]
    product_id: Option<String>,
    #[serde(default)]
    qty: Option<u32>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawShipping {
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    district: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    pincode: String,
}

impl From<RawShipping> for ShippingInfo {
    fn from(raw: RawShipping) -> Self {
        Self {
            email: raw.email,
            phone: raw.phone,
            first_name: raw.first_name,
            last_name: raw.last_name,
            city: raw.city,
            district: raw.district,
            address: raw.address,
            pincode: raw.pincode,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct AdvanceStatusRequest {
    status: String,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct OrderEnvelope {
    message: String,
    order: Order,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/orders/create — validate, reprice, and persist one order.
pub(super) async fn create_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderEnvelope>), ApiError> {
    // Fail-fast validation chain: the first violation wins, and nothing
    // touches the database until the payload is syntactically sound.
    let order_id = non_empty(body.order_id.as_deref());
    let user_id = non_empty(body.user_id.as_deref());
    let (Some(order_id), Some(user_id)) = (order_id, user_id) else {
        return Err(ApiError::bad_request("orderId or userId missing"));
    };

    if !DocId::is_valid(user_id) {
        return Err(ApiError::bad_request(
            "Invalid userId (must be a 24-character hex document id)",
        ));
    }

    let shipping: ShippingInfo = body.shipping.unwrap_or_default().into();
    if shipping.first_name.trim().is_empty()
        || shipping.address.trim().is_empty()
        || shipping.phone.trim().is_empty()
    {
        return Err(ApiError::bad_request("Shipping details missing"));
    }

    if body.items.is_empty() {
        return Err(ApiError::bad_request("Cart items missing"));
    }

    for item in &body.items {
        let ok = item
            .product_id
            .as_deref()
            .is_some_and(|id| DocId::is_valid(id));
        if !ok {
            let shown = item.product_id.as_deref().unwrap_or("<missing>");
            return Err(ApiError::bad_request(format!("Invalid productId: {shown}")));
        }
    }

    let payment_method: PaymentMethod = body
        .payment_method
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(ApiError::bad_request)?;
    let shipping_method: ShippingMethod = body
        .shipping_method
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(ApiError::bad_request)?;

    // Reprice from the catalog: client-submitted figures are never
    // trusted. A missing product id means the catalog can't vouch for
    // the line item at all.
    let doc_ids: Vec<String> = body
        .items
        .iter()
        .filter_map(|i| i.product_id.clone())
        .collect();
    let price_rows = dukaan_db::prices_for_ids(&state.pool, &doc_ids)
        .await
        .map_err(|e| map_db_error(&req_id.0, &e))?;
    let prices: HashMap<String, Decimal> = price_rows
        .into_iter()
        .map(|row| (row.doc_id.trim().to_owned(), row.price))
        .collect();

    let mut items = Vec::with_capacity(body.items.len());
    let mut subtotal = Decimal::ZERO;
    for raw in &body.items {
        let raw_id = raw.product_id.as_deref().unwrap_or_default();
        let Some(&price) = prices.get(raw_id) else {
            return Err(ApiError::bad_request(format!("Unknown productId: {raw_id}")));
        };
        let product_id: DocId = raw_id
            .parse()
            .map_err(|e: dukaan_core::ids::IdError| ApiError::bad_request(e.to_string()))?;
        let qty = raw.qty.unwrap_or(1).max(1);
        subtotal += price * Decimal::from(qty);
        items.push(OrderItem {
            product_id,
            qty,
            price,
            image: raw.image.clone(),
            title: raw.title.clone().unwrap_or_else(|| "Product".to_owned()),
        });
    }

    let shipping_fee = pricing::shipping_fee(shipping_method, items.len());
    let discount = body.discount.unwrap_or(Decimal::ZERO);
    if !pricing::is_known_discount(discount) {
        return Err(ApiError::bad_request(format!(
            "Invalid discount amount: {discount}"
        )));
    }

    let expected_total = pricing::grand_total(subtotal, shipping_fee, discount);
    let claimed_total = body.total_amount.unwrap_or(Decimal::ZERO);
    let tolerance = Decimal::new(TOTAL_TOLERANCE.0, TOTAL_TOLERANCE.1);
    if (claimed_total - expected_total).abs() > tolerance {
        return Err(ApiError::bad_request(format!(
            "totalAmount mismatch: expected {expected_total}, got {claimed_total}"
        )));
    }

    let first = &items[0];
    let image = first
        .image
        .clone()
        .unwrap_or_else(|| "/placeholder.png".to_owned());
    let product_name = first.title.clone();
    let name = shipping.full_name();
    let address = shipping.full_address();

    let new_order = dukaan_db::NewOrder {
        order_id,
        user_id,
        name: &name,
        address: &address,
        image: &image,
        product_name: &product_name,
        items: &items,
        shipping: &shipping,
        payment_method,
        shipping_method,
        subtotal,
        shipping_fee,
        discount,
        total_amount: expected_total,
    };

    let row = match dukaan_db::insert_order(&state.pool, &new_order).await {
        Ok(row) => row,
        Err(e) if e.is_unique_violation() => {
            return Err(ApiError::conflict(format!(
                "An order with orderId '{order_id}' already exists"
            )));
        }
        Err(e) => return Err(map_db_error(&req_id.0, &e)),
    };

    let order = row.into_order().map_err(|e| map_db_error(&req_id.0, &e))?;
    tracing::info!(order_id = %order.order_id, total = %order.total_amount, "order placed");

    Ok((
        StatusCode::CREATED,
        Json(OrderEnvelope {
            message: "Order placed successfully".to_owned(),
            order,
        }),
    ))
}

/// GET /api/orders — all orders, newest first (admin).
pub(super) async fn list_orders(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let rows = dukaan_db::list_orders(&state.pool)
        .await
        .map_err(|e| map_db_error(&req_id.0, &e))?;

    let orders = rows
        .into_iter()
        .map(dukaan_db::OrderRow::into_order)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| map_db_error(&req_id.0, &e))?;

    Ok(Json(orders))
}

/// GET /api/orders/{order_id} — single order for tracking.
pub(super) async fn get_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(order_id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let row = dukaan_db::get_order_by_order_id(&state.pool, &order_id)
        .await
        .map_err(|e| map_db_error(&req_id.0, &e))?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;

    let order = row.into_order().map_err(|e| map_db_error(&req_id.0, &e))?;
    Ok(Json(order))
}

/// PATCH /api/orders/{order_id}/status — advance the lifecycle.
pub(super) async fn advance_order_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(order_id): Path<String>,
    Json(body): Json<AdvanceStatusRequest>,
) -> Result<Json<OrderEnvelope>, ApiError> {
    let next: OrderStatus = body.status.parse().map_err(ApiError::bad_request)?;

    let row = dukaan_db::get_order_by_order_id(&state.pool, &order_id)
        .await
        .map_err(|e| map_db_error(&req_id.0, &e))?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;

    let current: OrderStatus = row
        .status
        .parse()
        .map_err(|e: String| map_db_error(&req_id.0, &dukaan_db::DbError::CorruptRow {
            entity: "order",
            id: order_id.clone(),
            reason: e,
        }))?;

    if !current.can_transition(next) {
        return Err(ApiError::conflict(format!(
            "Illegal status transition: {current} -> {next}"
        )));
    }

    let updated = dukaan_db::update_order_status(&state.pool, &order_id, current, next)
        .await
        .map_err(|e| map_db_error(&req_id.0, &e))?
        .ok_or_else(|| {
            // The guarded update found no row: someone advanced the
            // order between our read and write.
            ApiError::conflict("Order status changed concurrently; re-read and retry")
        })?;

    let order = updated
        .into_order()
        .map_err(|e| map_db_error(&req_id.0, &e))?;
    tracing::info!(order_id = %order.order_id, status = %order.status, "order status advanced");

    Ok(Json(OrderEnvelope {
        message: "Order status updated".to_owned(),
        order,
    }))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
