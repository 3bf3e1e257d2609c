//! Offline unit tests for dukaan-db pool configuration and row types.
//! These tests do not require a live database connection.

use chrono::Utc;
use dukaan_core::{AppConfig, Environment, OrderStatus};
use dukaan_db::{DbError, OrderRow, PoolConfig, ProductRow};
use rust_decimal::Decimal;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        checkout_request_timeout_secs: 30,
        checkout_max_retries: 3,
        checkout_retry_backoff_base_ms: 500,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

fn sample_order_row() -> OrderRow {
    OrderRow {
        id: 1,
        order_id: "ORD1700000000000".to_string(),
        user_id: "64b0f1c2a9d3e4f5a6b7c8d9".to_string(),
        name: "Asha Rao".to_string(),
        address: "12 MG Road, Pune, Pune - 411001".to_string(),
        image: "/uploads/mug.png".to_string(),
        product_name: "Mug".to_string(),
        items: serde_json::json!([
            {
                "productId": "64b0f1c2a9d3e4f5a6b7c8da",
                "qty": 2,
                "price": 120.0,
                "image": "/uploads/mug.png",
                "title": "Mug"
            }
        ]),
        shipping: serde_json::json!({
            "email": "a@b.com",
            "phone": "9999999999",
            "firstName": "Asha",
            "lastName": "Rao",
            "city": "Pune",
            "district": "Pune",
            "address": "12 MG Road",
            "pincode": "411001"
        }),
        payment_method: "cod".to_string(),
        shipping_method: "regular".to_string(),
        subtotal: Decimal::from(240),
        shipping_fee: Decimal::from(90),
        discount: Decimal::ZERO,
        total_amount: Decimal::from(330),
        status: "processing".to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn order_row_converts_to_domain_order() {
    let order = sample_order_row().into_order().expect("convert");

    assert_eq!(order.order_id, "ORD1700000000000");
    assert_eq!(order.status, OrderStatus::Processing);
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].qty, 2);
    assert_eq!(order.shipping.first_name, "Asha");
    assert_eq!(order.total_amount, Decimal::from(330));
}

#[test]
fn order_row_with_unknown_status_is_corrupt() {
    let mut row = sample_order_row();
    row.status = "misplaced".to_string();
    let err = row.into_order().unwrap_err();
    assert!(matches!(err, DbError::CorruptRow { entity: "order", .. }));
}

#[test]
fn order_row_with_malformed_items_is_corrupt() {
    let mut row = sample_order_row();
    row.items = serde_json::json!({ "not": "an array" });
    assert!(row.into_order().is_err());
}

#[test]
fn product_row_has_expected_fields() {
    let row = ProductRow {
        id: 7,
        doc_id: "64b0f1c2a9d3e4f5a6b7c8db".to_string(),
        title: "Lamp".to_string(),
        price: Decimal::from(450),
        old_price: Some(Decimal::from(500)),
        discount: Some("10%".to_string()),
        image: "/uploads/lamp.png".to_string(),
        description: None,
        bullets: vec!["warm light".to_string()],
        category: "furniture".to_string(),
        stock: 3,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    assert_eq!(row.doc_id.len(), 24);
    assert_eq!(row.category, "furniture");
    assert_eq!(row.stock, 3);
}
