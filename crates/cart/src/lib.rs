// Rust guideline compliant 2026-10-14

//! Cart synchronization engine.
//!
//! Keeps one shopper's cart consistent across a device-local store (guest) and
//! a server-resident table (signed in), switching between them when identity
//! changes.
//!
//! Entry point: [`CartStore`]. Configuration via [`CartConfig::builder`].
//!
//! - [`local`]: `CartAdapter` over synchronous key-value storage (one JSON blob).
//! - [`remote`]: `CartAdapter` over one user's rows in a `CartTable`.
//! - [`reconcile`]: the identity-driven controller selecting between them.
//! - [`aggregate`]: item count and per-currency totals.

pub mod aggregate;
pub mod local;
pub mod reconcile;
pub mod remote;
mod store;

pub use local::{DEFAULT_STORAGE_KEY, LocalAdapter};
pub use reconcile::{ActiveAdapter, ReconciliationController, Transition};
pub use remote::RemoteAdapter;
pub use store::{CartConfig, CartConfigBuilder, CartError, CartSnapshot, CartStore, SyncStatus};
