// Rust guideline compliant 2026-10-12

//! Device-local adapter for the `CartAdapter` port.
//!
//! The whole guest cart lives under one key as a JSON array of `CartItem`
//! records. Every mutation decodes the array, edits it, and rewrites the full
//! blob; there are no partial writes.

use domain::{CartAdapter, CartItem, KeyValueStore, PersistenceError, Product};

/// Storage key used by the storefront for the guest cart.
pub const DEFAULT_STORAGE_KEY: &str = "guestCart";

/// `CartAdapter` backed by a synchronous `KeyValueStore`.
#[derive(Debug)]
pub struct LocalAdapter<S: KeyValueStore> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> LocalAdapter<S> {
    /// Create an adapter that keeps the cart under `key` in `store`.
    #[must_use]
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self { store, key: key.into() }
    }

    /// Storage key holding the cart blob.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Borrow the underlying key-value store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    fn read_items(&self) -> Result<Vec<CartItem>, PersistenceError> {
        let Some(blob) = self.store.get(&self.key)? else {
            return Ok(vec![]);
        };
        serde_json::from_str(&blob).map_err(|e| {
            tracing::error!(key = %self.key, "local_adapter.decode: {e}");
            PersistenceError::Read { reason: format!("corrupt cart blob: {e}") }
        })
    }

    fn write_items(&self, items: &[CartItem]) -> Result<(), PersistenceError> {
        let blob = serde_json::to_string(items).map_err(|e| {
            tracing::error!(key = %self.key, "local_adapter.encode: {e}");
            PersistenceError::Write { reason: format!("cannot encode cart: {e}") }
        })?;
        self.store.set(&self.key, &blob)
    }
}

impl<S: KeyValueStore> CartAdapter for LocalAdapter<S> {
    /// Decode the stored blob. An absent key is an empty cart.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Read` when storage fails or the blob does not decode.
    async fn load(&self) -> Result<Vec<CartItem>, PersistenceError> {
        let items = self.read_items()?;
        tracing::debug!(key = %self.key, lines = items.len(), "local_adapter.load");
        Ok(items)
    }

    /// Overwrite the quantity of an existing line or append a new one, then
    /// rewrite the whole blob.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Read` when the current blob cannot be decoded
    /// and `PersistenceError::Write` when the new blob cannot be stored.
    async fn upsert_item(&self, product: &Product, quantity: u32) -> Result<(), PersistenceError> {
        let mut items = self.read_items()?;
        match items.iter_mut().find(|item| item.id() == product.id) {
            Some(item) => item.quantity = quantity,
            None => items.push(CartItem::new(product.clone(), quantity)),
        }
        self.write_items(&items)
    }

    /// Drop the line for `product_id` and rewrite the whole blob.
    ///
    /// # Errors
    ///
    /// Same as [`upsert_item`](Self::upsert_item).
    async fn remove_item(&self, product_id: &str) -> Result<(), PersistenceError> {
        let mut items = self.read_items()?;
        items.retain(|item| item.id() != product_id);
        self.write_items(&items)
    }

    /// Remove the key entirely (full local wipe).
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Write` when storage cannot be written.
    async fn clear(&self) -> Result<(), PersistenceError> {
        tracing::debug!(key = %self.key, "local_adapter.clear");
        self.store.remove(&self.key)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
