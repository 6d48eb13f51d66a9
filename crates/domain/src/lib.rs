// Rust guideline compliant 2026-10-12

//! Shared domain types for the storefront cart engine.
//!
//! Defines `Product`, `CartItem`, `CartMode`, `Totals`, the error types, and the
//! hexagonal port traits: `CartAdapter`, `KeyValueStore`, `CartTable`,
//! `Catalog`, and `Identity`. Every other crate depends on this one; nothing in
//! the workspace is imported here.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A catalog product. Owned by the catalog service; read-only to the cart.
///
/// Serialized field names follow the device-local storage format
/// (`priceNGN`, `priceUSD`, `inStock`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Catalog identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Catalog category (e.g. "Skincare").
    pub category: String,
    /// Fixed price in Nigerian naira.
    #[serde(rename = "priceNGN")]
    pub price_ngn: f64,
    /// Fixed price in US dollars.
    #[serde(rename = "priceUSD")]
    pub price_usd: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(rename = "inStock", default, skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
}

/// A product line in the cart.
///
/// `quantity` is always `>= 1` for items held by the cart; a line whose
/// quantity would drop to zero is removed instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product fields, flattened into the same JSON object as `quantity`.
    #[serde(flatten)]
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    /// Create a line for `product` with the given `quantity`.
    #[must_use]
    pub fn new(product: Product, quantity: u32) -> Self {
        Self { product, quantity }
    }

    /// Return the product id, delegating to the wrapped product.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.product.id
    }
}

/// Opaque identifier of an authenticated shopper.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(uuid::Uuid);

impl UserId {
    #[must_use]
    pub fn new(id: uuid::Uuid) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn as_uuid(&self) -> uuid::Uuid {
        self.0
    }
}

impl From<uuid::Uuid> for UserId {
    fn from(id: uuid::Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Which backing store is authoritative for the cart.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CartMode {
    /// Device-local cart, no identity attached.
    #[default]
    Guest,
    /// Server-owned cart for the given shopper.
    Authenticated(UserId),
}

impl CartMode {
    /// Build the mode matching an identity value.
    #[must_use]
    pub fn from_user(user: Option<UserId>) -> Self {
        user.map_or(Self::Guest, Self::Authenticated)
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Self::Guest => None,
            Self::Authenticated(user) => Some(user),
        }
    }
}

/// The two currencies every product is pre-priced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Currency {
    /// Nigerian naira (storefront default).
    #[default]
    Ngn,
    /// US dollar.
    Usd,
}

impl Currency {
    /// ISO 4217 code.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Ngn => "NGN",
            Self::Usd => "USD",
        }
    }
}

/// Aggregates derived from the cart's items.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Totals {
    /// Sum of all quantities.
    pub total_items: u64,
    /// Sum of `price_ngn * quantity`.
    pub total_price_ngn: f64,
    /// Sum of `price_usd * quantity`.
    pub total_price_usd: f64,
}

impl Totals {
    /// Subtotal in `currency`. Picks the stored total; never converts.
    #[must_use]
    pub fn subtotal(&self, currency: Currency) -> f64 {
        match currency {
            Currency::Ngn => self.total_price_ngn,
            Currency::Usd => self.total_price_usd,
        }
    }
}

/// Errors from the persistence ports (`CartAdapter`, `KeyValueStore`, `CartTable`).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    /// Stored cart state could not be read or decoded.
    #[error("persistence read failed: {reason}")]
    Read {
        /// Human-readable description.
        reason: String,
    },
    /// A cart mutation could not be persisted.
    #[error("persistence write failed: {reason}")]
    Write {
        /// Human-readable description.
        reason: String,
    },
}

/// Errors from the `Catalog` port.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// The catalog backend could not answer.
    #[error("catalog unavailable: {reason}")]
    Unavailable {
        /// Human-readable description.
        reason: String,
    },
}

/// Errors from the `Identity` port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// The identity source has shut down; no further notifications will arrive.
    #[error("identity source closed")]
    Closed,
}

/// Hexagonal port: one cart persistence backend.
///
/// Implemented by the device-local and the server-resident adapters. The cart
/// store is written once against this trait and never branches on which
/// backend is active.
#[expect(
    async_fn_in_trait,
    reason = "no dyn dispatch needed; internal workspace only"
)]
pub trait CartAdapter {
    /// Load every cart line, in display order.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Read` when the backend cannot be read.
    async fn load(&self) -> Result<Vec<CartItem>, PersistenceError>;

    /// Insert `product` with `quantity`, or overwrite the quantity of an existing line.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Write` when the write is not applied.
    async fn upsert_item(&self, product: &Product, quantity: u32) -> Result<(), PersistenceError>;

    /// Delete the line for `product_id`. Deleting an absent line succeeds.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Write` when the write is not applied.
    async fn remove_item(&self, product_id: &str) -> Result<(), PersistenceError>;

    /// Delete every line owned by this backend's scope.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Write` when the write is not applied.
    async fn clear(&self) -> Result<(), PersistenceError>;
}

/// Hexagonal port: synchronous device-local key-value storage.
pub trait KeyValueStore {
    /// Read the value stored under `key`; `None` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Read` when storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Write` when storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;

    /// Remove `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Write` when storage cannot be written.
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}

/// Hexagonal port: the server-side `cart_items` table.
///
/// Rows are keyed by `(user, product_id)`. Reads join the catalog so returned
/// lines carry current product fields rather than add-time snapshots.
#[expect(
    async_fn_in_trait,
    reason = "no dyn dispatch needed; internal workspace only"
)]
pub trait CartTable {
    /// Every line for `user`, joined against the catalog.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Read` on backend failure.
    async fn select_by_user(&self, user: &UserId) -> Result<Vec<CartItem>, PersistenceError>;

    /// Insert or overwrite the quantity of row `(user, product_id)`.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Write` on backend failure.
    async fn upsert(
        &self,
        user: &UserId,
        product_id: &str,
        quantity: u32,
    ) -> Result<(), PersistenceError>;

    /// Delete row `(user, product_id)`.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Write` on backend failure.
    async fn delete(&self, user: &UserId, product_id: &str) -> Result<(), PersistenceError>;

    /// Delete every row for `user`.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Write` on backend failure.
    async fn delete_by_user(&self, user: &UserId) -> Result<(), PersistenceError>;
}

/// Hexagonal port: read-only product catalog.
#[expect(
    async_fn_in_trait,
    reason = "no dyn dispatch needed; internal workspace only"
)]
pub trait Catalog {
    /// Look up a single product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Unavailable` on backend failure.
    async fn product(&self, id: &str) -> Result<Option<Product>, CatalogError>;

    /// Every product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Unavailable` on backend failure.
    async fn products(&self) -> Result<Vec<Product>, CatalogError>;
}

/// Hexagonal port: the authentication service as seen by the cart.
///
/// The cart never signs users in or out; it only observes the current value
/// and its changes.
#[expect(
    async_fn_in_trait,
    reason = "no dyn dispatch needed; internal workspace only"
)]
pub trait Identity {
    /// The currently signed-in user, if any.
    fn current_user(&self) -> Option<UserId>;

    /// Wait for the next identity change and return the new value.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Closed` once the source has shut down.
    async fn changed(&mut self) -> Result<Option<UserId>, IdentityError>;
}
