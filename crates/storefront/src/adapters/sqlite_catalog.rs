// Rust guideline compliant 2026-10-15

//! SQLite adapter for the `Catalog` port.
//!
//! Reads the `products` table. [`SqliteCatalog::seed`] is the only write path
//! and exists for the demo binary and tests; the cart itself never writes to
//! the catalog.

use domain::{Catalog, CatalogError, Product};

use super::sqlite::ProductRow;

const SELECT_BY_ID: &str = "SELECT id, name, category, price_ngn, price_usd,
        description, image_url, in_stock, featured
 FROM products
 WHERE id = ?";

const SELECT_NEWEST_FIRST: &str = "SELECT id, name, category, price_ngn, price_usd,
        description, image_url, in_stock, featured
 FROM products
 ORDER BY created_at DESC, rowid DESC";

/// `Catalog` adapter over the `products` table.
#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    pool: sqlx::SqlitePool,
}

impl SqliteCatalog {
    /// Wrap a pool opened with [`super::sqlite::connect`].
    #[must_use]
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert `products`, overwriting the fields of any id already present.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` on the first failed insert.
    pub async fn seed(&self, products: &[Product]) -> Result<(), sqlx::Error> {
        for p in products {
            sqlx::query(
                "INSERT INTO products
                 (id, name, category, price_ngn, price_usd, description,
                  image_url, in_stock, featured)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT (id) DO UPDATE SET
                    name        = excluded.name,
                    category    = excluded.category,
                    price_ngn   = excluded.price_ngn,
                    price_usd   = excluded.price_usd,
                    description = excluded.description,
                    image_url   = excluded.image_url,
                    in_stock    = excluded.in_stock,
                    featured    = excluded.featured",
            )
            .bind(&p.id)
            .bind(&p.name)
            .bind(&p.category)
            .bind(p.price_ngn)
            .bind(p.price_usd)
            .bind(&p.description)
            .bind(&p.image)
            .bind(p.in_stock)
            .bind(p.featured)
            .execute(&self.pool)
            .await?;
        }
        tracing::info!(count = products.len(), "sqlite_catalog.seeded");
        Ok(())
    }
}

fn unavailable(op: &str, e: &sqlx::Error) -> CatalogError {
    tracing::error!("sqlite_catalog.{op}: {e}");
    CatalogError::Unavailable { reason: e.to_string() }
}

impl Catalog for SqliteCatalog {
    /// # Errors
    ///
    /// Returns `CatalogError::Unavailable` on any `sqlx` error; the underlying
    /// error is logged at `error` level before mapping.
    async fn product(&self, id: &str) -> Result<Option<Product>, CatalogError> {
        let row: Option<ProductRow> = sqlx::query_as(SELECT_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| unavailable("product", &e))?;
        Ok(row.map(Product::from))
    }

    /// Newest first; rows created in the same second fall back to insertion order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Unavailable` on any `sqlx` error.
    async fn products(&self) -> Result<Vec<Product>, CatalogError> {
        let rows: Vec<ProductRow> = sqlx::query_as(SELECT_NEWEST_FIRST)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| unavailable("products", &e))?;
        Ok(rows.into_iter().map(Product::from).collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
