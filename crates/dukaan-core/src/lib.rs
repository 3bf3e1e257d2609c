//! Domain types and pure logic for the dukaan storefront: document ids,
//! the cart store, checkout pricing policy, order payloads, the order
//! lifecycle state machine, and application configuration.

use thiserror::Error;

pub mod app_config;
pub mod cart;
mod config;
pub mod ids;
pub mod orders;
pub mod pricing;

#[cfg(test)]
mod cart_test;

pub use app_config::{AppConfig, Environment};
pub use cart::{
    cart_total, CartError, CartItem, CartReadback, CartStore, FileStorage, KeyValueStorage,
    MemoryStorage, ProductSnapshot, StorageError, CART_KEY,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use ids::DocId;
pub use orders::{Order, OrderDraft, OrderItem, OrderStatus, ShippingInfo};
pub use pricing::{PaymentMethod, Quote, ShippingMethod};

/// Errors from loading or validating application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
