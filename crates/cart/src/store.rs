// Rust guideline compliant 2026-10-14

//! The cart store: in-memory cart, mutation operations, published snapshots.
//!
//! # Read-after-write contract
//!
//! Every mutation performs exactly one persistence call on the active adapter
//! followed by one full reload from that same adapter. The in-memory cart is
//! only ever replaced by what the adapter returned; it is never patched with
//! locally computed results. A failed write or reload leaves the items as they
//! were and marks the snapshot [`SyncStatus::Stale`].
//!
//! # Ordering
//!
//! Mutations and reconciliations run one at a time through an async mutex.
//! Callers that arrive while one is in flight wait in FIFO order; nothing is
//! dropped. Two rapid `add_item` calls for the same product therefore both
//! land.

use std::cell::RefCell;
use std::collections::HashSet;

use domain::{
    CartAdapter as _, CartItem, CartMode, CartTable, Catalog, CatalogError, Identity,
    IdentityError, KeyValueStore, PersistenceError, Product, Totals, UserId,
};
use tokio::sync::{Mutex, watch};

use crate::aggregate;
use crate::local::{DEFAULT_STORAGE_KEY, LocalAdapter};
use crate::reconcile::{ActiveAdapter, ReconciliationController, Transition};

// ---------------------------------------------------------------------------
// CartError
// ---------------------------------------------------------------------------

/// Errors returned by [`CartStore`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    /// The supplied configuration is invalid.
    #[error("invalid cart configuration: {reason}")]
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
    /// The active adapter failed to read or write.
    #[error("cart persistence error: {0}")]
    Persistence(#[from] PersistenceError),
    /// The catalog could not be queried.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
    /// The catalog has no product with this id.
    #[error("product not found: {id}")]
    ProductNotFound {
        /// Requested product id.
        id: String,
    },
}

// ---------------------------------------------------------------------------
// CartConfig + builder
// ---------------------------------------------------------------------------

/// Runtime configuration for a [`CartStore`].
///
/// Construct via [`CartConfig::builder`].
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Device-local key under which the guest cart is stored.
    pub storage_key: String,
}

/// Builder for [`CartConfig`].
///
/// Obtain via [`CartConfig::builder`]; finalize with [`build`](Self::build).
#[derive(Debug)]
pub struct CartConfigBuilder {
    storage_key: String,
}

impl CartConfig {
    /// Create a builder.
    ///
    /// Default values: `storage_key = "guestCart"`.
    #[must_use]
    pub fn builder() -> CartConfigBuilder {
        CartConfigBuilder { storage_key: DEFAULT_STORAGE_KEY.to_owned() }
    }
}

impl CartConfigBuilder {
    /// Override the guest-cart storage key.
    #[must_use]
    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidConfig`] when the storage key is blank.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<CartConfig, CartError> {
        if self.storage_key.trim().is_empty() {
            return Err(CartError::InvalidConfig {
                reason: "storage_key must not be blank".to_owned(),
            });
        }
        Ok(CartConfig { storage_key: self.storage_key })
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// How the published items relate to the active adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Not yet loaded, or the last operation failed; items may not match the adapter.
    Stale,
    /// A mutation or reload holds the queue. Set when the operation's turn
    /// starts, not while it waits behind another.
    InFlight,
    /// Items are exactly what the adapter returned on the last reload.
    Settled,
}

/// Published view of the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSnapshot {
    /// Backend the items belong to.
    pub mode: CartMode,
    /// Cart lines in display order; ids unique, quantities `>= 1`.
    pub items: Vec<CartItem>,
    pub status: SyncStatus,
    /// Error of the last failed operation; cleared by the next successful reload.
    pub last_failure: Option<PersistenceError>,
}

impl CartSnapshot {
    fn empty(mode: CartMode) -> Self {
        Self { mode, items: vec![], status: SyncStatus::Stale, last_failure: None }
    }

    /// Aggregates over `items`, computed on every call.
    #[must_use]
    pub fn totals(&self) -> Totals {
        aggregate::totals(&self.items)
    }

    #[must_use]
    pub fn item(&self, product_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id() == product_id)
    }

    #[must_use]
    pub fn quantity_of(&self, product_id: &str) -> Option<u32> {
        self.item(product_id).map(|item| item.quantity)
    }
}

/// Drop lines that violate the cart invariants (zero quantity, repeated id).
fn normalize(items: Vec<CartItem>) -> Vec<CartItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            if item.quantity == 0 {
                tracing::warn!(
                    product_id = %item.id(),
                    "cart.normalize: dropping zero-quantity line"
                );
                return false;
            }
            if !seen.insert(item.id().to_owned()) {
                tracing::warn!(product_id = %item.id(), "cart.normalize: dropping duplicate line");
                return false;
            }
            true
        })
        .collect()
}

// ---------------------------------------------------------------------------
// CartStore
// ---------------------------------------------------------------------------

/// Public state container for one shopper session.
///
/// Construct once per session and pass by reference. Generic over the
/// device-local store `S` and the server table `T`; which of the two is
/// authoritative is decided by the embedded [`ReconciliationController`].
#[derive(Debug)]
pub struct CartStore<S: KeyValueStore, T: CartTable> {
    local: LocalAdapter<S>,
    table: T,
    /// Only borrowed between await points.
    controller: RefCell<ReconciliationController>,
    state: watch::Sender<CartSnapshot>,
    /// Serializes mutations and reconciliations.
    queue: Mutex<()>,
}

impl<S: KeyValueStore, T: CartTable> CartStore<S, T> {
    /// Create a store in the mode matching `initial_user`.
    ///
    /// The cart starts empty and [`SyncStatus::Stale`]. The initial load is
    /// done by [`refresh`](Self::refresh), by
    /// [`run_identity_sync`](Self::run_identity_sync), or by the first
    /// quantity-deriving mutation.
    #[must_use]
    pub fn new(
        config: &CartConfig,
        local_store: S,
        table: T,
        initial_user: Option<UserId>,
    ) -> Self {
        let controller = ReconciliationController::new(initial_user);
        let (state, _) = watch::channel(CartSnapshot::empty(controller.mode().clone()));
        Self {
            local: LocalAdapter::new(local_store, config.storage_key.clone()),
            table,
            controller: RefCell::new(controller),
            state,
            queue: Mutex::new(()),
        }
    }

    /// Subscribe to snapshot changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.state.subscribe()
    }

    /// Clone the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.state.borrow().clone()
    }

    /// Totals over the current items.
    #[must_use]
    pub fn totals(&self) -> Totals {
        self.state.borrow().totals()
    }

    #[must_use]
    pub fn mode(&self) -> CartMode {
        self.controller.borrow().mode().clone()
    }

    #[must_use]
    pub fn status(&self) -> SyncStatus {
        self.state.borrow().status
    }

    /// The device-local adapter, regardless of the active mode.
    #[must_use]
    pub fn local(&self) -> &LocalAdapter<S> {
        &self.local
    }

    /// The server table, regardless of the active mode.
    #[must_use]
    pub fn table(&self) -> &T {
        &self.table
    }

    /// Add one unit of `product`: insert with quantity 1, or increment.
    ///
    /// The increment is computed from `Settled` items only; a stale cart is
    /// reloaded from the active adapter first.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persistence`] when the catch-up reload, the write,
    /// or the final reload fails. Nothing is written if the catch-up fails.
    pub async fn add_item(&self, product: &Product) -> Result<(), CartError> {
        let _turn = self.queue.lock().await;
        let adapter = self.begin_from_current().await?;
        let quantity = self
            .state
            .borrow()
            .quantity_of(&product.id)
            .map_or(1, |q| q.saturating_add(1));
        tracing::debug!(product_id = %product.id, quantity, "cart.add_item");
        let written = adapter.upsert_item(product, quantity).await;
        self.settle(&adapter, written).await
    }

    /// Look `product_id` up in `catalog` and add one unit of it.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ProductNotFound`] for unknown ids,
    /// [`CartError::Catalog`] when the lookup fails, or the errors of
    /// [`add_item`](Self::add_item).
    pub async fn add_item_by_id<C: Catalog>(
        &self,
        catalog: &C,
        product_id: &str,
    ) -> Result<(), CartError> {
        let product = catalog
            .product(product_id)
            .await?
            .ok_or_else(|| CartError::ProductNotFound { id: product_id.to_owned() })?;
        self.add_item(&product).await
    }

    /// Remove the line for `product_id` whatever its quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persistence`] when the write or the reload fails.
    pub async fn remove_item(&self, product_id: &str) -> Result<(), CartError> {
        let _turn = self.queue.lock().await;
        tracing::debug!(product_id, "cart.remove_item");
        let adapter = self.begin();
        let written = adapter.remove_item(product_id).await;
        self.settle(&adapter, written).await
    }

    /// Set the quantity of a line already in the cart.
    ///
    /// `quantity <= 0` is a removal. A product that is not in the cart is left
    /// alone and `Ok(())` is returned without writing to the adapter. A cart
    /// that is not `Settled` is reloaded before the lookup.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persistence`] when the catch-up reload, the write,
    /// or the final reload fails.
    pub async fn set_quantity(&self, product_id: &str, quantity: i64) -> Result<(), CartError> {
        if quantity <= 0 {
            return self.remove_item(product_id).await;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        let _turn = self.queue.lock().await;
        let adapter = self.begin_from_current().await?;
        let in_cart = self.state.borrow().item(product_id).map(|item| item.product.clone());
        let Some(product) = in_cart else {
            tracing::debug!(product_id, "cart.set_quantity: not in cart, ignored");
            self.state.send_modify(|s| s.status = SyncStatus::Settled);
            return Ok(());
        };
        tracing::debug!(product_id, quantity, "cart.set_quantity");
        let written = adapter.upsert_item(&product, quantity).await;
        self.settle(&adapter, written).await
    }

    /// Empty the cart. Guest mode wipes the local key; authenticated mode
    /// deletes this user's rows only.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persistence`] when the write or the reload fails.
    pub async fn clear(&self) -> Result<(), CartError> {
        let _turn = self.queue.lock().await;
        tracing::debug!("cart.clear");
        let adapter = self.begin();
        let written = adapter.clear().await;
        self.settle(&adapter, written).await
    }

    /// Reload from the active adapter without writing anything.
    ///
    /// Used for the initial load and to recover from [`SyncStatus::Stale`].
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persistence`] when the reload fails.
    pub async fn refresh(&self) -> Result<(), CartError> {
        let _turn = self.queue.lock().await;
        let adapter = self.begin();
        self.reload(&adapter).await
    }

    /// Apply an identity value and, on a transition, reload from the newly
    /// selected adapter.
    ///
    /// The displayed items are replaced, never merged: logging in shows only
    /// the server cart; logging out shows whatever the device last stored.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persistence`] when the reload fails. The mode has
    /// switched regardless; the snapshot is left empty and `Stale` until a
    /// [`refresh`](Self::refresh) succeeds.
    pub async fn reconcile(&self, user: Option<UserId>) -> Result<Option<Transition>, CartError> {
        let _turn = self.queue.lock().await;
        let Some(transition) = self.controller.borrow_mut().observe(user) else {
            return Ok(None);
        };
        let adapter = self.begin();
        let mode = adapter.mode();
        self.state.send_modify(|s| {
            s.mode = mode;
            s.items.clear();
        });
        self.reload(&adapter).await?;
        Ok(Some(transition))
    }

    /// Follow `identity` until it closes.
    ///
    /// Catches up with the current identity first, loading the cart when the
    /// store has not been loaded yet, then reconciles on every change
    /// notification. Reload failures do not stop the loop; they are
    /// published through the snapshot's status and `last_failure`.
    pub async fn run_identity_sync<I: Identity>(&self, identity: &mut I) {
        let caught_up = match self.reconcile(identity.current_user()).await {
            Ok(None) if self.status() != SyncStatus::Settled => self.refresh().await,
            Ok(_) => Ok(()),
            Err(e) => Err(e),
        };
        if let Err(e) = caught_up {
            tracing::warn!("cart.identity_sync.reload_failed: {e}");
        }
        loop {
            let user = match identity.changed().await {
                Ok(next) => next,
                Err(IdentityError::Closed) => {
                    tracing::info!("cart.identity_sync.stopped: identity source closed");
                    return;
                }
            };
            if let Err(e) = self.reconcile(user).await {
                tracing::warn!("cart.identity_sync.reload_failed: {e}");
            }
        }
    }

    /// Publish `InFlight` and select the adapter. Called once the caller holds
    /// the queue; callers still waiting for their turn are not reflected.
    fn begin(&self) -> ActiveAdapter<'_, S, T> {
        self.state.send_modify(|s| s.status = SyncStatus::InFlight);
        self.controller.borrow().select(&self.local, &self.table)
    }

    /// Like [`begin`](Self::begin), for mutations that derive the new quantity
    /// from the current items: unless the snapshot is `Settled`, the items are
    /// reloaded first so the computation never starts from a stale view.
    async fn begin_from_current(&self) -> Result<ActiveAdapter<'_, S, T>, CartError> {
        let settled = self.status() == SyncStatus::Settled;
        let adapter = self.begin();
        if !settled {
            tracing::debug!(mode = ?adapter.mode(), "cart.catch_up: reloading before mutation");
            self.reload(&adapter).await?;
        }
        Ok(adapter)
    }

    async fn settle(
        &self,
        adapter: &ActiveAdapter<'_, S, T>,
        written: Result<(), PersistenceError>,
    ) -> Result<(), CartError> {
        if let Err(e) = written {
            tracing::warn!(mode = ?adapter.mode(), "cart.write_failed: {e}");
            self.mark_stale(e.clone());
            return Err(e.into());
        }
        self.reload(adapter).await
    }

    async fn reload(&self, adapter: &ActiveAdapter<'_, S, T>) -> Result<(), CartError> {
        match adapter.load().await {
            Ok(items) => {
                let items = normalize(items);
                let mode = adapter.mode();
                tracing::debug!(?mode, lines = items.len(), "cart.reloaded");
                self.state.send_modify(|s| {
                    s.mode = mode;
                    s.items = items;
                    s.status = SyncStatus::Settled;
                    s.last_failure = None;
                });
                Ok(())
            }
            Err(e) => {
                tracing::warn!(mode = ?adapter.mode(), "cart.reload_failed: {e}");
                self.mark_stale(e.clone());
                Err(e.into())
            }
        }
    }

    fn mark_stale(&self, failure: PersistenceError) {
        self.state.send_modify(|s| {
            s.status = SyncStatus::Stale;
            s.last_failure = Some(failure);
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
