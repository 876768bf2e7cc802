//! Cart session: optimistic local state synchronized with the server.
//!
//! The session is the only writer of the in-memory cart; the server is the
//! eventual source of truth, reconciled asynchronously.
//!
//! # Synchronization model
//!
//! - Quantity changes apply to local state immediately and synchronously,
//!   then commit to the server after a debounce delay. A newer change to
//!   the same line cancels and replaces the pending commit, so only the
//!   final quantity of a burst is ever sent. Writes to different lines are
//!   independent and may be in flight concurrently.
//! - A failed commit discards the optimistic guess: every pending write is
//!   cancelled and the authoritative cart is re-fetched and adopted whole.
//!   No partial patching.
//! - Add and remove are discrete user actions, not adjustment gestures:
//!   they are not debounced and adopt the server's cart from the mutation
//!   envelope before returning. Pending quantity writes are flushed ahead
//!   of them, so adopting the envelope never reverts an optimistic
//!   quantity.
//! - Decrementing a line already at quantity 1 removes it; quantity 0 is
//!   never written to the server.
//!
//! Cart operations before [`CartSession::start`] has provisioned a cart
//! are silent no-ops; the UI is expected to gate on readiness.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, instrument, warn};

use shopfront_core::{CartId, Notice, ProductId, format_usd};

use crate::api::types::{Cart, CartItem, CheckoutRequest, Order, Product};
use crate::api::ApiClient;
use crate::checkout::{Totals, compute_totals};
use crate::config::StoreConfig;

/// How long the "item added" notice stays visible.
const ADD_NOTICE_TTL: Duration = Duration::from_secs(3);

/// How long checkout notices stay visible.
const CHECKOUT_NOTICE_TTL: Duration = Duration::from_secs(5);

/// A quantity write waiting out its debounce delay.
struct PendingWrite {
    /// Write sequence this slot belongs to; a superseded timer that lost
    /// the abort race bails out when the sequence no longer matches.
    seq: u64,
    /// Latest requested quantity for the line.
    quantity: u32,
    timer: JoinHandle<()>,
}

#[derive(Default)]
struct SessionState {
    catalog: Vec<Product>,
    cart: Option<Cart>,
    pending: HashMap<ProductId, PendingWrite>,
    notice: Option<Notice>,
    notice_seq: u64,
    write_seq: u64,
}

// =============================================================================
// CartSession
// =============================================================================

/// One shopper's cart session.
///
/// Cheap to clone; all clones share the same state. Background timers hold
/// their own handle to it, so state outlives the visible session until
/// every pending commit settles or is aborted.
#[derive(Clone)]
pub struct CartSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    api: ApiClient,
    debounce: Duration,
    state: Mutex<SessionState>,
}

impl CartSession {
    /// Create a session. No network traffic until [`start`](Self::start).
    #[must_use]
    pub fn new(api: ApiClient, config: &StoreConfig) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                api,
                debounce: config.debounce,
                state: Mutex::new(SessionState::default()),
            }),
        }
    }

    /// Load the catalog and provision the session cart.
    ///
    /// A catalog read failure degrades to an empty catalog; it is logged,
    /// never surfaced as a notice. A cart-provisioning failure leaves the
    /// session cart-less, and every cart operation stays a silent no-op.
    #[instrument(skip(self))]
    pub async fn start(&self) {
        match self.inner.api.products().await {
            Ok(products) => self.inner.lock_state().catalog = products,
            Err(e) => warn!(error = %e, "Failed to load catalog, starting empty"),
        }

        match self.inner.api.create_cart().await {
            Ok(cart) => self.inner.lock_state().cart = Some(cart),
            Err(e) => error!(error = %e, "Failed to provision cart"),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Whether a cart has been provisioned.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner.lock_state().cart.is_some()
    }

    /// Snapshot of the product catalog.
    #[must_use]
    pub fn catalog(&self) -> Vec<Product> {
        self.inner.lock_state().catalog.clone()
    }

    /// Snapshot of the current cart.
    #[must_use]
    pub fn cart(&self) -> Option<Cart> {
        self.inner.lock_state().cart.clone()
    }

    /// Id of the current cart.
    #[must_use]
    pub fn cart_id(&self) -> Option<CartId> {
        self.inner.lock_state().cart.as_ref().map(|c| c.id.clone())
    }

    /// Total item count across cart lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.inner
            .lock_state()
            .cart
            .as_ref()
            .map_or(0, Cart::item_count)
    }

    /// The current transient notice, if any.
    #[must_use]
    pub fn notice(&self) -> Option<Notice> {
        self.inner.lock_state().notice.clone()
    }

    /// Dismiss the current notice.
    pub fn clear_notice(&self) {
        let mut state = self.inner.lock_state();
        state.notice_seq += 1;
        state.notice = None;
    }

    /// Cart-review totals against the session catalog.
    #[must_use]
    pub fn totals(&self, applied_code: Option<&str>) -> Totals {
        let state = self.inner.lock_state();
        state.cart.as_ref().map_or(
            Totals {
                subtotal: rust_decimal::Decimal::ZERO,
                discount: rust_decimal::Decimal::ZERO,
                total: rust_decimal::Decimal::ZERO,
            },
            |cart| compute_totals(cart, &state.catalog, applied_code),
        )
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of a product to the cart.
    ///
    /// Not debounced: awaits the server and adopts its cart. Pending
    /// quantity writes are flushed first so adopting the envelope cannot
    /// revert an optimistic quantity. Success and failure both surface a
    /// transient notice.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_item(&self, product_id: &ProductId) {
        let Some(cart_id) = self.cart_id() else { return };
        self.flush().await;

        let item = CartItem {
            product_id: product_id.clone(),
            quantity: 1,
        };
        match self.inner.api.add_item(&cart_id, &item).await {
            Ok(envelope) => {
                self.inner.lock_state().cart = Some(envelope.cart);
                self.set_notice(Notice::success("Item added to cart!"), ADD_NOTICE_TTL);
            }
            Err(e) => {
                warn!(error = %e, "Failed to add item to cart");
                self.set_notice(Notice::error("Failed to add item to cart"), ADD_NOTICE_TTL);
            }
        }
    }

    /// Remove a line from the cart.
    ///
    /// Not debounced: awaits the server and adopts its cart. A pending
    /// quantity write for this line is superseded by the removal; writes
    /// for other lines are flushed so adopting the envelope cannot revert
    /// them.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_item(&self, product_id: &ProductId) {
        let Some(cart_id) = self.cart_id() else { return };

        if let Some(pending) = self.inner.lock_state().pending.remove(product_id) {
            pending.timer.abort();
        }
        self.flush().await;

        match self.inner.api.remove_item(&cart_id, product_id).await {
            Ok(envelope) => self.inner.lock_state().cart = Some(envelope.cart),
            Err(e) => {
                warn!(error = %e, "Failed to remove item from cart");
                self.set_notice(
                    Notice::error("Failed to remove item from cart"),
                    ADD_NOTICE_TTL,
                );
            }
        }
    }

    /// Set the quantity of a cart line.
    ///
    /// Applies to local state immediately, then commits after the debounce
    /// delay; a newer call for the same line within the delay replaces the
    /// pending commit. Quantity 0 removes the line instead. A line the
    /// cart does not hold is a no-op.
    #[instrument(skip(self), fields(product_id = %product_id, quantity))]
    pub async fn set_quantity(&self, product_id: &ProductId, quantity: u32) {
        if quantity == 0 {
            return self.remove_item(product_id).await;
        }
        let Some(cart_id) = self.cart_id() else { return };

        let mut state = self.inner.lock_state();
        let Some(item) = state
            .cart
            .as_mut()
            .and_then(|cart| {
                cart.items
                    .iter_mut()
                    .find(|item| item.product_id == *product_id)
            })
        else {
            return;
        };
        item.quantity = quantity;

        state.write_seq += 1;
        let seq = state.write_seq;
        if let Some(prev) = state.pending.remove(product_id) {
            prev.timer.abort();
        }

        let inner = Arc::clone(&self.inner);
        let pid = product_id.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(inner.debounce).await;
            inner.commit_quantity(&cart_id, &pid, seq).await;
        });
        state.pending.insert(
            product_id.clone(),
            PendingWrite {
                seq,
                quantity,
                timer,
            },
        );
    }

    /// Increase a line's quantity by one.
    pub async fn increment(&self, product_id: &ProductId) {
        let Some(quantity) = self.line_quantity(product_id) else {
            return;
        };
        self.set_quantity(product_id, quantity + 1).await;
    }

    /// Decrease a line's quantity by one. At quantity 1 the line is
    /// removed rather than written down to zero.
    pub async fn decrement(&self, product_id: &ProductId) {
        match self.line_quantity(product_id) {
            None => {}
            Some(1) => self.remove_item(product_id).await,
            Some(quantity) => self.set_quantity(product_id, quantity - 1).await,
        }
    }

    /// Send every pending quantity write now instead of on its timer.
    ///
    /// A failed write falls back to reconciliation and abandons the rest
    /// of the batch; the full resync supersedes them.
    #[instrument(skip(self))]
    pub async fn flush(&self) {
        let Some(cart_id) = self.cart_id() else { return };

        let writes: Vec<(ProductId, u32)> = {
            let mut state = self.inner.lock_state();
            state
                .pending
                .drain()
                .map(|(product_id, pending)| {
                    pending.timer.abort();
                    (product_id, pending.quantity)
                })
                .collect()
        };

        for (product_id, quantity) in writes {
            if let Err(e) = self
                .inner
                .api
                .update_item_quantity(&cart_id, &product_id, quantity)
                .await
            {
                warn!(error = %e, product_id = %product_id, "Flush write failed, reconciling");
                self.inner.reconcile(&cart_id).await;
                return;
            }
        }
    }

    /// Check out the session cart, optionally redeeming a discount code.
    ///
    /// Pending quantity writes are flushed first so the server sees the
    /// optimistic state. On success the notice reports the
    /// server-authoritative total and a fresh cart is provisioned
    /// immediately; the order is returned for callers that want it. On
    /// failure the notice carries the server's detail when present.
    #[instrument(skip(self))]
    pub async fn checkout(&self, discount_code: Option<&str>) -> Option<Order> {
        let Some(cart_id) = self.cart_id() else {
            return None;
        };
        self.flush().await;

        let request = CheckoutRequest {
            cart_id,
            discount_code: discount_code
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(str::to_string),
        };

        match self.inner.api.checkout(&request).await {
            Ok(order) => {
                let text = format!(
                    "Order placed successfully! Total: {}",
                    format_usd(order.total)
                );
                self.set_notice(Notice::success(text), CHECKOUT_NOTICE_TTL);

                // The server dropped the old cart; provision the next one now
                match self.inner.api.create_cart().await {
                    Ok(cart) => self.inner.lock_state().cart = Some(cart),
                    Err(e) => {
                        error!(error = %e, "Failed to provision cart after checkout");
                        self.inner.lock_state().cart = None;
                    }
                }
                Some(order)
            }
            Err(e) => {
                warn!(error = %e, "Checkout failed");
                let text = e
                    .detail()
                    .map_or_else(|| "Checkout failed".to_string(), str::to_string);
                self.set_notice(Notice::error(text), CHECKOUT_NOTICE_TTL);
                None
            }
        }
    }

    /// Tear the session down: cancel pending commits and drop local state
    /// so no late result can apply to it.
    pub fn shutdown(&self) {
        let mut state = self.inner.lock_state();
        for (_, pending) in state.pending.drain() {
            pending.timer.abort();
        }
        state.notice_seq += 1;
        state.cart = None;
        state.notice = None;
    }

    fn line_quantity(&self, product_id: &ProductId) -> Option<u32> {
        self.inner
            .lock_state()
            .cart
            .as_ref()
            .and_then(|cart| cart.item(product_id))
            .map(|item| item.quantity)
    }

    fn set_notice(&self, notice: Notice, ttl: Duration) {
        let seq = {
            let mut state = self.inner.lock_state();
            state.notice_seq += 1;
            state.notice = Some(notice);
            state.notice_seq
        };

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let mut state = inner.lock_state();
            // A newer notice owns the slot now
            if state.notice_seq == seq {
                state.notice = None;
            }
        });
    }
}

// =============================================================================
// Internals
// =============================================================================

impl SessionInner {
    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Commit the debounced write for `seq`, unless a newer write took the
    /// slot while this timer slept.
    async fn commit_quantity(&self, cart_id: &CartId, product_id: &ProductId, seq: u64) {
        let quantity = {
            let state = self.lock_state();
            match state.pending.get(product_id) {
                Some(pending) if pending.seq == seq => pending.quantity,
                _ => return, // superseded
            }
        };

        match self
            .api
            .update_item_quantity(cart_id, product_id, quantity)
            .await
        {
            Ok(_envelope) => {
                // Confirmed: the optimistic state already matches; retire
                // the slot unless a newer write claimed it meanwhile
                let mut state = self.lock_state();
                if state
                    .pending
                    .get(product_id)
                    .is_some_and(|pending| pending.seq == seq)
                {
                    state.pending.remove(product_id);
                }
            }
            Err(e) => {
                warn!(
                    error = %e,
                    product_id = %product_id,
                    "Debounced quantity write failed, reconciling"
                );
                self.reconcile(cart_id).await;
            }
        }
    }

    /// Discard every optimistic guess and adopt the server's cart whole.
    async fn reconcile(&self, cart_id: &CartId) {
        {
            let mut state = self.lock_state();
            for (_, pending) in state.pending.drain() {
                pending.timer.abort();
            }
        }

        match self.api.cart(cart_id).await {
            Ok(cart) => {
                let mut state = self.lock_state();
                // The session may have moved on to a fresh cart meanwhile
                if state.cart.as_ref().is_some_and(|c| c.id == *cart_id) {
                    state.cart = Some(cart);
                }
            }
            Err(e) => error!(error = %e, "Failed to re-fetch cart during reconciliation"),
        }
    }
}
