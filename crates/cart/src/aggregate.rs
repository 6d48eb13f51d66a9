// Rust guideline compliant 2026-10-12

//! Aggregate calculator: a pure fold over cart lines.
//!
//! Both currency totals come from each product's own stored prices; nothing
//! is converted. Callers recompute on every read instead of caching.

use domain::{CartItem, Totals};

/// Fold `items` into item count and per-currency subtotals.
#[must_use]
pub fn totals(items: &[CartItem]) -> Totals {
    items.iter().fold(Totals::default(), |acc, item| {
        let quantity = f64::from(item.quantity);
        Totals {
            total_items: acc.total_items + u64::from(item.quantity),
            total_price_ngn: acc.total_price_ngn + item.product.price_ngn * quantity,
            total_price_usd: acc.total_price_usd + item.product.price_usd * quantity,
        }
    })
}
