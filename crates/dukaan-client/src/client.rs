//! HTTP client for the storefront order API.
//!
//! Wraps `reqwest` with the storefront's error envelope handling and
//! typed request/response bodies. Use [`OrdersClient::with_base_url`] to
//! point at a mock server in tests.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use dukaan_core::{Order, OrderDraft};

use crate::error::CheckoutError;

const DEFAULT_BASE_URL: &str = "http://localhost:3000/";

/// The success envelope returned by the order-creation endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PlacedOrder {
    pub message: String,
    pub order: Order,
}

/// Error envelope the API uses for every non-2xx response.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Client for the storefront order API.
pub struct OrdersClient {
    client: Client,
    base_url: Url,
}

impl OrdersClient {
    /// Creates a client pointed at the local storefront server.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64) -> Result<Self, CheckoutError> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout_secs)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`CheckoutError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> Result<Self, CheckoutError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("dukaan-client/0.1")
            .build()?;

        // Normalise: exactly one trailing slash so join() appends to the
        // root path instead of replacing the last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|_| CheckoutError::InvalidBaseUrl(base_url.to_owned()))?;

        Ok(Self { client, base_url })
    }

    /// Submits one order for creation.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::Api`] if the server rejects the order (including
    ///   HTTP 409 for a duplicate order id).
    /// - [`CheckoutError::Http`] on network failure or timeout.
    /// - [`CheckoutError::Deserialize`] if the response body does not
    ///   match the expected envelope.
    pub async fn place_order(&self, draft: &OrderDraft) -> Result<PlacedOrder, CheckoutError> {
        let url = self.endpoint("api/orders/create")?;
        let response = self.client.post(url).json(draft).send().await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(Self::api_error(status, &bytes));
        }

        serde_json::from_slice(&bytes).map_err(|e| CheckoutError::Deserialize {
            context: format!("place_order({})", draft.order_id),
            source: e,
        })
    }

    /// Fetches one order by its order id, for tracking.
    ///
    /// Returns `Ok(None)` when the server has no such order.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::Api`] on any non-404 error response.
    /// - [`CheckoutError::Http`] on network failure or timeout.
    /// - [`CheckoutError::Deserialize`] if the body does not parse.
    pub async fn fetch_order(&self, order_id: &str) -> Result<Option<Order>, CheckoutError> {
        let url = self.endpoint(&format!("api/orders/{order_id}"))?;
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(Self::api_error(status, &bytes));
        }

        let order = serde_json::from_slice(&bytes).map_err(|e| CheckoutError::Deserialize {
            context: format!("fetch_order({order_id})"),
            source: e,
        })?;
        Ok(Some(order))
    }

    fn endpoint(&self, path: &str) -> Result<Url, CheckoutError> {
        self.base_url
            .join(path)
            .map_err(|_| CheckoutError::InvalidBaseUrl(format!("{}{path}", self.base_url)))
    }

    fn api_error(status: StatusCode, body: &[u8]) -> CheckoutError {
        let message = serde_json::from_slice::<ApiErrorBody>(body)
            .map_or_else(|_| String::from_utf8_lossy(body).into_owned(), |b| b.message);
        CheckoutError::Api {
            status: status.as_u16(),
            message,
        }
    }
}
