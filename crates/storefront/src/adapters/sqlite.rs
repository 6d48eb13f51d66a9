// Rust guideline compliant 2026-10-15

//! Shared SQLite connection and schema for the catalog and cart adapters.
//!
//! Both tables live in one database so cart reads can join the catalog.
//!
//! # Single connection
//!
//! The pool is capped at one connection with no idle timeout. The storefront
//! runs on a `current_thread` runtime and issues one query at a time, and a
//! `sqlite::memory:` database only lives as long as its connection.

use domain::Product;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

const PRODUCTS_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS products (
    id          TEXT    PRIMARY KEY,
    name        TEXT    NOT NULL,
    category    TEXT    NOT NULL,
    price_ngn   REAL    NOT NULL,
    price_usd   REAL    NOT NULL,
    description TEXT,
    image_url   TEXT,
    in_stock    INTEGER,            -- NULL / 0 / 1
    featured    INTEGER,            -- NULL / 0 / 1
    created_at  TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

const CART_ITEMS_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS cart_items (
    user_id    TEXT    NOT NULL,
    product_id TEXT    NOT NULL REFERENCES products (id) ON DELETE CASCADE,
    quantity   INTEGER NOT NULL CHECK (quantity > 0),
    PRIMARY KEY (user_id, product_id)
)";

/// Open or create the database at `db_url` and ensure both tables exist.
///
/// # Errors
///
/// Returns `sqlx::Error` when the connection or schema creation fails.
pub async fn connect(db_url: &str) -> Result<sqlx::SqlitePool, sqlx::Error> {
    // sqlx 0.8 defaults to create_if_missing(false) for file databases.
    let opts = db_url
        .parse::<SqliteConnectOptions>()?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(opts)
        .await?;
    sqlx::query(PRODUCTS_SCHEMA).execute(&pool).await?;
    sqlx::query(CART_ITEMS_SCHEMA).execute(&pool).await?;
    tracing::debug!(db_url, "sqlite.connected");
    Ok(pool)
}

/// Column set of the `products` table, as selected by both adapters.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: String,
    name: String,
    category: String,
    price_ngn: f64,
    price_usd: f64,
    description: Option<String>,
    image_url: Option<String>,
    in_stock: Option<bool>,
    featured: Option<bool>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            category: row.category,
            price_ngn: row.price_ngn,
            price_usd: row.price_usd,
            description: row.description,
            image: row.image_url,
            in_stock: row.in_stock,
            featured: row.featured,
        }
    }
}
