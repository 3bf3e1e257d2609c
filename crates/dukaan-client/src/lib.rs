//! Shopper-side library for the dukaan storefront: the checkout flow,
//! the order API client, and local order tracking.

pub mod checkout;
pub mod client;
pub mod error;
mod retry;
pub mod tracking;

pub use checkout::{CheckoutConfig, CheckoutDetails, CheckoutFlow};
pub use client::{OrdersClient, PlacedOrder};
pub use error::CheckoutError;
pub use tracking::{TrackedOrder, LAST_ORDER_KEY};
