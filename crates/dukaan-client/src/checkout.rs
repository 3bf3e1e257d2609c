//! The checkout flow: validate, price, submit, then commit the cart.
//!
//! The cart is only cleared after the server confirms the order, so a
//! failed or abandoned checkout leaves the shopper's cart intact. Order
//! ids are generated client-side, which makes retried submissions
//! idempotent: the server keeps at most one order per id.

use chrono::Utc;
use rust_decimal::Decimal;

use dukaan_core::cart::{CartItem, CartStore, KeyValueStorage};
use dukaan_core::{
    pricing, DocId, Order, OrderDraft, OrderItem, PaymentMethod, Quote, ShippingInfo,
    ShippingMethod,
};

use crate::client::OrdersClient;
use crate::error::CheckoutError;
use crate::retry::retry_with_backoff;
use crate::tracking;

/// Submission tuning. Defaults match the server's client-config knobs.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutConfig {
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_ms: 500,
        }
    }
}

impl CheckoutConfig {
    #[must_use]
    pub fn from_app_config(config: &dukaan_core::AppConfig) -> Self {
        Self {
            max_retries: config.checkout_max_retries,
            backoff_base_ms: config.checkout_retry_backoff_base_ms,
        }
    }
}

/// Everything the shopper chose at checkout besides the cart itself.
#[derive(Debug, Clone)]
pub struct CheckoutDetails {
    pub shipping: ShippingInfo,
    pub payment_method: PaymentMethod,
    pub shipping_method: ShippingMethod,
    /// Raw coupon code as typed; `None` or blank means no coupon.
    pub coupon: Option<String>,
}

/// Drives one checkout from a cart to a confirmed order.
pub struct CheckoutFlow<S> {
    cart: CartStore<S>,
    client: OrdersClient,
    config: CheckoutConfig,
}

impl<S: KeyValueStorage> CheckoutFlow<S> {
    pub fn new(cart: CartStore<S>, client: OrdersClient, config: CheckoutConfig) -> Self {
        Self {
            cart,
            client,
            config,
        }
    }

    /// The underlying cart, for inspection and mutation between checkouts.
    pub fn cart_mut(&mut self) -> &mut CartStore<S> {
        &mut self.cart
    }

    /// Validates the shipping details and cart, prices the order,
    /// submits it, and on confirmation records it locally and clears
    /// the cart.
    ///
    /// A duplicate-id conflict after retries is treated as success once
    /// the server confirms the order exists: the id was generated for
    /// this checkout, so a conflict means an earlier attempt landed.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::ShippingIncomplete`] listing the empty fields.
    /// - [`CheckoutError::EmptyCart`] when nothing valid is in the cart.
    /// - [`CheckoutError::CartPruned`] when invalid entries had to be
    ///   removed first.
    /// - [`CheckoutError::InvalidCoupon`] for an unknown coupon code.
    /// - [`CheckoutError::Api`] / [`CheckoutError::Http`] when submission
    ///   ultimately fails; the cart is left untouched.
    pub async fn place_order(
        &mut self,
        user_id: DocId,
        details: &CheckoutDetails,
    ) -> Result<Order, CheckoutError> {
        let missing = details.shipping.missing_fields();
        if !missing.is_empty() {
            return Err(CheckoutError::ShippingIncomplete(missing));
        }

        // Reading the cart prunes entries whose ids no longer parse.
        // Submitting right after a prune would charge for a cart the
        // shopper has not seen, so stop and let them review it.
        let readback = self.cart.read()?;
        if readback.pruned > 0 {
            return Err(CheckoutError::CartPruned(readback.pruned));
        }
        let items = readback.items;
        if items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let discount = resolve_coupon(details.coupon.as_deref())?;
        let quote = Quote::compute(&items, details.shipping_method, discount);
        let order_id = generate_order_id();

        let draft = OrderDraft {
            order_id: order_id.clone(),
            user_id,
            items: items.iter().filter_map(to_order_item).collect(),
            shipping: details.shipping.clone(),
            payment_method: details.payment_method,
            shipping_method: details.shipping_method,
            subtotal: quote.subtotal,
            shipping_fee: quote.shipping_fee,
            discount: quote.discount,
            total_amount: quote.grand_total,
        };

        let order = self.submit(&draft).await?;
        tracing::info!(order_id = %order.order_id, total = %order.total_amount, "order confirmed");

        tracking::record(self.cart.storage_mut(), &order)?;
        self.cart.clear()?;
        Ok(order)
    }

    async fn submit(&self, draft: &OrderDraft) -> Result<Order, CheckoutError> {
        let placed = retry_with_backoff(self.config.max_retries, self.config.backoff_base_ms, || {
            self.client.place_order(draft)
        })
        .await;

        match placed {
            Ok(placed) => Ok(placed.order),
            Err(err) if err.is_conflict() => {
                // A retried submission can conflict with itself when the
                // first attempt landed but its response was lost.
                tracing::warn!(order_id = %draft.order_id, "conflict on submit, checking for an earlier landing");
                self.client
                    .fetch_order(&draft.order_id)
                    .await?
                    .ok_or(err)
            }
            Err(err) => Err(err),
        }
    }
}

/// Resolves a typed coupon code to its flat discount. Blank input means
/// no coupon; an unknown code is an error rather than a silent zero.
fn resolve_coupon(coupon: Option<&str>) -> Result<Decimal, CheckoutError> {
    match coupon.map(str::trim).filter(|c| !c.is_empty()) {
        None => Ok(Decimal::ZERO),
        Some(code) => {
            pricing::coupon_discount(code).ok_or_else(|| CheckoutError::InvalidCoupon(code.to_owned()))
        }
    }
}

/// `ORD` + unix milliseconds, matching the ids shown on receipts.
fn generate_order_id() -> String {
    format!("ORD{}", Utc::now().timestamp_millis())
}

fn to_order_item(item: &CartItem) -> Option<OrderItem> {
    let product_id: DocId = match item.product_id.parse() {
        Ok(id) => id,
        Err(e) => {
            // items() already pruned malformed ids; this is belt only.
            tracing::warn!(product_id = %item.product_id, error = %e, "skipping unparseable cart item");
            return None;
        }
    };
    Some(OrderItem {
        product_id,
        qty: item.qty,
        price: item.price,
        image: item.image.clone(),
        title: item.title.clone(),
    })
}
