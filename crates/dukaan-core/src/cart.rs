//! The shopper's cart store.
//!
//! The cart is a persisted JSON array of [`CartItem`] kept under the
//! `cart_v1` key, owned by exactly one shopper session. All persistence
//! goes through the [`KeyValueStorage`] seam so the backing store can be
//! swapped (in-memory for tests, a JSON file standing in for browser
//! local storage, a session service later) without touching checkout.
//!
//! Reads fail soft: unparseable state yields an empty cart, and items
//! whose product id is not a valid document id are pruned on every read
//! rather than propagated to checkout.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::DocId;

/// Storage key for the persisted cart. Kept verbatim for round-trip
/// compatibility with previously written carts.
pub const CART_KEY: &str = "cart_v1";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum CartError {
    /// The product payload carried no usable identifier. Accepting such
    /// an item corrupts checkout later, so the add is refused outright.
    #[error("product is missing a usable id (_id / id / productId)")]
    MissingProductId,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// String-keyed storage with single-value atomic writes.
pub trait KeyValueStorage {
    /// Returns the raw value for `key`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing store cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key` if present.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing store cannot be written.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-memory storage for tests and short-lived sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: BTreeMap<String, String>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.values.remove(key);
        Ok(())
    }
}

/// File-backed storage: one JSON object mapping keys to raw values.
///
/// A missing file reads as empty storage; every write rewrites the whole
/// file. Last writer wins when two processes share a path — the same
/// race the original browser storage had, accepted here as well.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let raw = serde_json::to_string(map)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_map()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self.read_map()?;
        map.insert(key.to_owned(), value.to_owned());
        self.write_map(&map)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let mut map = self.read_map()?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

/// One product-quantity pair pending purchase.
///
/// Serialized shape (camelCase, optional fields omitted) matches the
/// persisted `cart_v1` array exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: String,
    pub title: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub qty: u32,
}

/// A product as received from the catalog, about to be added to a cart.
///
/// Upstream payloads name the identifier `_id`, `id`, or `productId`
/// depending on the endpoint; all three are accepted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    #[serde(default, alias = "_id", alias = "productId")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub old_price: Option<Decimal>,
    #[serde(default)]
    pub discount: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Result of reading the cart: the usable items plus how many invalid
/// entries were pruned along the way.
#[derive(Debug, Default)]
pub struct CartReadback {
    pub items: Vec<CartItem>,
    pub pruned: usize,
}

/// Cart operations over a [`KeyValueStorage`] backend.
#[derive(Debug)]
pub struct CartStore<S> {
    storage: S,
}

impl<S: KeyValueStorage> CartStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Returns the current cart items.
    ///
    /// Unparseable persisted state reads as an empty cart. Items whose
    /// product id is not a valid document id are dropped and the pruned
    /// list is written back, self-healing previously corrupted state.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] if the backend fails.
    pub fn items(&mut self) -> Result<Vec<CartItem>, CartError> {
        Ok(self.read()?.items)
    }

    /// Like [`items`](CartStore::items), but also reports how many
    /// entries were pruned. Checkout aborts on a non-zero count so the
    /// shopper sees the healed cart before paying for it.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] if the backend fails.
    pub fn read(&mut self) -> Result<CartReadback, CartError> {
        let Some(raw) = self.storage.get(CART_KEY)? else {
            return Ok(CartReadback::default());
        };

        let Ok(items) = serde_json::from_str::<Vec<CartItem>>(&raw) else {
            return Ok(CartReadback::default());
        };

        let before = items.len();
        let valid: Vec<CartItem> = items
            .into_iter()
            .filter(|item| DocId::is_valid(&item.product_id))
            .collect();

        let pruned = before - valid.len();
        if pruned > 0 {
            self.set_items(&valid)?;
        }

        Ok(CartReadback {
            items: valid,
            pruned,
        })
    }

    /// Replaces the persisted cart with `items` in one write.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] if the backend fails.
    pub fn set_items(&mut self, items: &[CartItem]) -> Result<(), CartError> {
        let raw = serde_json::to_string(items).map_err(StorageError::from)?;
        self.storage.set(CART_KEY, &raw)?;
        Ok(())
    }

    /// Adds `qty` units of `product` to the cart.
    ///
    /// If an item with the same product id already exists its quantity
    /// increases; otherwise a new item is appended. Returns the updated
    /// cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::MissingProductId`] if the snapshot carries
    /// no identifier, or [`CartError::Storage`] if persistence fails.
    pub fn add(&mut self, product: &ProductSnapshot, qty: u32) -> Result<Vec<CartItem>, CartError> {
        let id = product
            .id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(CartError::MissingProductId)?;

        let qty = qty.max(1);
        let mut items = self.items()?;

        if let Some(existing) = items.iter_mut().find(|i| i.product_id == id) {
            existing.qty += qty;
        } else {
            items.push(CartItem {
                product_id: id.to_owned(),
                title: product.title.clone(),
                price: product.price,
                old_price: product.old_price,
                discount: product.discount.clone(),
                image: product.image.clone(),
                category: product.category.clone(),
                qty,
            });
        }

        self.set_items(&items)?;
        Ok(items)
    }

    /// Sets the quantity of the item with `product_id`.
    ///
    /// A quantity of zero or less removes the item entirely; negative
    /// quantities are never stored. Returns the updated cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] if persistence fails.
    pub fn update_qty(&mut self, product_id: &str, qty: i32) -> Result<Vec<CartItem>, CartError> {
        let mut items = self.items()?;

        if qty <= 0 {
            items.retain(|i| i.product_id != product_id);
        } else {
            #[allow(clippy::cast_sign_loss)]
            let qty = qty as u32;
            for item in &mut items {
                if item.product_id == product_id {
                    item.qty = qty;
                }
            }
        }

        self.set_items(&items)?;
        Ok(items)
    }

    /// Removes all persisted items. Called only after a server-confirmed
    /// successful order.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] if the backend fails.
    pub fn clear(&mut self) -> Result<(), CartError> {
        self.storage.remove(CART_KEY)?;
        Ok(())
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}

/// Sum of `price × qty` over all items. Pure; order-independent.
#[must_use]
pub fn cart_total(items: &[CartItem]) -> Decimal {
    items
        .iter()
        .map(|item| item.price * Decimal::from(item.qty))
        .sum()
}
