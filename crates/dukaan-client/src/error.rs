use thiserror::Error;

/// Errors surfaced by the checkout flow and the order API client.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The order API answered with a non-success status and a message.
    #[error("order API rejected the request (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),

    /// One or more shipping fields were empty. Checkout never submits a
    /// partially filled address.
    #[error("shipping details incomplete: missing {}", .0.join(", "))]
    ShippingIncomplete(Vec<&'static str>),

    #[error("cart is empty")]
    EmptyCart,

    /// Invalid entries were removed from the cart during checkout. The
    /// shopper should review the corrected cart before submitting.
    #[error("{0} invalid cart item(s) were removed; review the cart and retry")]
    CartPruned(usize),

    /// The coupon code is not in the coupon table. The discount stays at
    /// zero and checkout stops so the shopper can correct the code.
    #[error("invalid coupon code '{0}'")]
    InvalidCoupon(String),

    #[error(transparent)]
    Cart(#[from] dukaan_core::cart::CartError),

    #[error(transparent)]
    Storage(#[from] dukaan_core::cart::StorageError),
}

impl CheckoutError {
    /// `true` when the server refused the order id as already taken.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, CheckoutError::Api { status: 409, .. })
    }
}
