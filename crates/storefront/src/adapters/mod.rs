// Rust guideline compliant 2026-10-16

//! Adapters (secondary ports) for the storefront binary.
//!
//! Each sub-module implements one port trait from the `domain` crate against a
//! concrete backend.

pub mod file_store;
pub mod sqlite;
pub mod sqlite_cart_table;
pub mod sqlite_catalog;
pub mod watch_identity;
