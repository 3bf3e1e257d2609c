use rust_decimal::Decimal;

use crate::cart::{
    cart_total, CartError, CartItem, CartStore, FileStorage, KeyValueStorage, MemoryStorage,
    ProductSnapshot, CART_KEY,
};

const VALID_ID: &str = "64b0f1c2a9d3e4f5a6b7c8d9";
const OTHER_ID: &str = "64b0f1c2a9d3e4f5a6b7c8da";

fn snapshot(id: Option<&str>, title: &str, price: i64) -> ProductSnapshot {
    ProductSnapshot {
        id: id.map(ToOwned::to_owned),
        title: title.to_owned(),
        price: Decimal::from(price),
        old_price: None,
        discount: None,
        image: Some("/uploads/x.png".to_owned()),
        category: Some("general".to_owned()),
    }
}

fn store() -> CartStore<MemoryStorage> {
    CartStore::new(MemoryStorage::new())
}

#[test]
fn empty_storage_reads_as_empty_cart() {
    let mut cart = store();
    assert!(cart.items().expect("read").is_empty());
}

#[test]
fn adding_same_product_twice_increments_qty() {
    let mut cart = store();
    cart.add(&snapshot(Some(VALID_ID), "Mug", 120), 1).expect("add");
    let items = cart.add(&snapshot(Some(VALID_ID), "Mug", 120), 1).expect("add");

    assert_eq!(items.len(), 1, "same product must never duplicate");
    assert_eq!(items[0].qty, 2);
}

#[test]
fn add_without_id_is_an_explicit_error() {
    let mut cart = store();
    let err = cart.add(&snapshot(None, "Ghost", 10), 1).unwrap_err();
    assert!(matches!(err, CartError::MissingProductId));
    assert!(cart.items().expect("read").is_empty(), "nothing persisted");
}

#[test]
fn snapshot_id_accepts_underscore_id_alias() {
    let raw = serde_json::json!({
        "_id": VALID_ID,
        "title": "Lamp",
        "price": 450
    });
    let parsed: ProductSnapshot = serde_json::from_value(raw).expect("parse");
    assert_eq!(parsed.id.as_deref(), Some(VALID_ID));
}

#[test]
fn zero_qty_removes_the_item() {
    let mut cart = store();
    cart.add(&snapshot(Some(VALID_ID), "Mug", 120), 1).expect("add");
    cart.add(&snapshot(Some(OTHER_ID), "Lamp", 450), 2).expect("add");

    let items = cart.update_qty(VALID_ID, 0).expect("update");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product_id, OTHER_ID);
}

#[test]
fn update_qty_sets_exact_quantity() {
    let mut cart = store();
    cart.add(&snapshot(Some(VALID_ID), "Mug", 120), 1).expect("add");
    let items = cart.update_qty(VALID_ID, 5).expect("update");
    assert_eq!(items[0].qty, 5);
}

#[test]
fn total_is_sum_of_price_times_qty_and_order_independent() {
    let a = CartItem {
        product_id: VALID_ID.to_owned(),
        title: "Mug".to_owned(),
        price: Decimal::from(120),
        old_price: None,
        discount: None,
        image: None,
        category: None,
        qty: 2,
    };
    let b = CartItem {
        product_id: OTHER_ID.to_owned(),
        title: "Lamp".to_owned(),
        price: Decimal::from(450),
        old_price: None,
        discount: None,
        image: None,
        category: None,
        qty: 1,
    };

    let forward = cart_total(&[a.clone(), b.clone()]);
    let reversed = cart_total(&[b, a]);
    assert_eq!(forward, Decimal::from(690));
    assert_eq!(forward, reversed);
}

#[test]
fn corrupt_json_reads_as_empty_cart() {
    let mut storage = MemoryStorage::new();
    storage.set(CART_KEY, "{not json").expect("set");
    let mut cart = CartStore::new(storage);
    assert!(cart.items().expect("read").is_empty());
}

#[test]
fn malformed_product_ids_are_pruned_on_read() {
    let mut storage = MemoryStorage::new();
    let raw = serde_json::json!([
        { "productId": VALID_ID, "title": "Mug", "price": 120.0, "qty": 1 },
        { "productId": "bad-id", "title": "Ghost", "price": 10.0, "qty": 1 }
    ]);
    storage.set(CART_KEY, &raw.to_string()).expect("set");

    let mut cart = CartStore::new(storage);
    let readback = cart.read().expect("read");
    assert_eq!(readback.pruned, 1);
    assert_eq!(readback.items.len(), 1);
    assert_eq!(readback.items[0].product_id, VALID_ID);

    // A follow-up read reports nothing left to prune.
    assert_eq!(cart.read().expect("read").pruned, 0);

    // Pruned list was written back: a second read sees the healed state
    // even without re-filtering.
    let persisted = cart.storage_mut().get(CART_KEY).expect("get").expect("some");
    let reparsed: Vec<CartItem> = serde_json::from_str(&persisted).expect("parse");
    assert_eq!(reparsed.len(), 1);
}

#[test]
fn clear_removes_the_persisted_list() {
    let mut cart = store();
    cart.add(&snapshot(Some(VALID_ID), "Mug", 120), 1).expect("add");
    cart.clear().expect("clear");
    assert!(cart.items().expect("read").is_empty());
    assert!(cart.storage_mut().get(CART_KEY).expect("get").is_none());
}

#[test]
fn file_storage_round_trips_the_cart_array() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("session.json");

    {
        let mut cart = CartStore::new(FileStorage::new(&path));
        cart.add(&snapshot(Some(VALID_ID), "Mug", 120), 2).expect("add");
    }

    // A fresh store over the same file sees the same cart.
    let mut cart = CartStore::new(FileStorage::new(&path));
    let items = cart.items().expect("read");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].qty, 2);
    assert_eq!(items[0].price, Decimal::from(120));
}
