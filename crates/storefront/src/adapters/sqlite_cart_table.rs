// Rust guideline compliant 2026-10-15

//! SQLite adapter for the `CartTable` port.
//!
//! Rows of `cart_items` are keyed by `(user_id, product_id)` and hold only a
//! quantity. Reads join `products`, so a line always shows the catalog's
//! current name and prices.
//!
//! # Upsert semantics
//!
//! `INSERT ... ON CONFLICT DO UPDATE` overwrites the quantity unconditionally
//! (last write wins per row). The row keeps its `rowid`, which is the display
//! order returned by [`CartTable::select_by_user`].

use domain::{CartItem, CartTable, PersistenceError, Product, UserId};

use super::sqlite::ProductRow;

/// Joined row: product columns plus the stored quantity.
#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    #[sqlx(flatten)]
    product: ProductRow,
    quantity: i64,
}

/// `CartTable` adapter over `cart_items` joined with `products`.
#[derive(Debug, Clone)]
pub struct SqliteCartTable {
    pool: sqlx::SqlitePool,
}

impl SqliteCartTable {
    /// Wrap a pool opened with [`super::sqlite::connect`].
    #[must_use]
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

fn read_failure(op: &str, e: &sqlx::Error) -> PersistenceError {
    tracing::error!("sqlite_cart.{op}: {e}");
    PersistenceError::Read { reason: e.to_string() }
}

fn write_failure(op: &str, e: &sqlx::Error) -> PersistenceError {
    tracing::error!("sqlite_cart.{op}: {e}");
    PersistenceError::Write { reason: e.to_string() }
}

impl CartTable for SqliteCartTable {
    /// # Errors
    ///
    /// Returns `PersistenceError::Read` on any `sqlx` error, or when a stored
    /// quantity does not fit a cart quantity.
    async fn select_by_user(&self, user: &UserId) -> Result<Vec<CartItem>, PersistenceError> {
        let rows: Vec<CartRow> = sqlx::query_as(
            "SELECT p.id, p.name, p.category, p.price_ngn, p.price_usd,
                    p.description, p.image_url, p.in_stock, p.featured,
                    c.quantity
             FROM cart_items c
             JOIN products p ON p.id = c.product_id
             WHERE c.user_id = ?
             ORDER BY c.rowid",
        )
        .bind(user.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| read_failure("select_by_user", &e))?;

        rows.into_iter()
            .map(|row| {
                let quantity = u32::try_from(row.quantity).map_err(|e| {
                    tracing::error!(quantity = row.quantity, "sqlite_cart.select_by_user: {e}");
                    PersistenceError::Read { reason: format!("invalid quantity {}", row.quantity) }
                })?;
                Ok(CartItem::new(Product::from(row.product), quantity))
            })
            .collect()
    }

    /// # Errors
    ///
    /// Returns `PersistenceError::Write` on any `sqlx` error, including an
    /// unknown `product_id` (foreign key violation).
    async fn upsert(
        &self,
        user: &UserId,
        product_id: &str,
        quantity: u32,
    ) -> Result<(), PersistenceError> {
        sqlx::query(
            "INSERT INTO cart_items (user_id, product_id, quantity)
             VALUES (?, ?, ?)
             ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = excluded.quantity",
        )
        .bind(user.to_string())
        .bind(product_id)
        .bind(i64::from(quantity))
        .execute(&self.pool)
        .await
        .map_err(|e| write_failure("upsert", &e))?;
        tracing::debug!(user_id = %user, product_id, quantity, "sqlite_cart.upsert");
        Ok(())
    }

    async fn delete(&self, user: &UserId, product_id: &str) -> Result<(), PersistenceError> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = ? AND product_id = ?")
            .bind(user.to_string())
            .bind(product_id)
            .execute(&self.pool)
            .await
            .map_err(|e| write_failure("delete", &e))?;
        Ok(())
    }

    async fn delete_by_user(&self, user: &UserId) -> Result<(), PersistenceError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = ?")
            .bind(user.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| write_failure("delete_by_user", &e))?;
        tracing::debug!(
            user_id = %user,
            rows = result.rows_affected(),
            "sqlite_cart.delete_by_user"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::SqliteCartTable;
    use crate::adapters::sqlite::connect;
    use crate::adapters::sqlite_catalog::SqliteCatalog;
    use domain::{CartTable as _, PersistenceError, Product, UserId};

    // Each test opens its own in-memory database (single-connection pool), so
    // tests are isolated with no on-disk side-effects.
    async fn make_table(catalog: &[Product]) -> (SqliteCartTable, SqliteCatalog) {
        let pool = connect("sqlite::memory:").await.expect("in-memory SQLite should open");
        let products = SqliteCatalog::new(pool.clone());
        products.seed(catalog).await.unwrap();
        (SqliteCartTable::new(pool), products)
    }

    fn make_product(id: &str, price_ngn: f64) -> Product {
        Product {
            id: id.to_owned(),
            name: format!("Product {id}"),
            category: "Skincare".to_owned(),
            price_ngn,
            price_usd: 3.0,
            description: None,
            image: Some(format!("/images/{id}.jpg")),
            in_stock: Some(true),
            featured: Some(false),
        }
    }

    fn make_user() -> UserId {
        UserId::new(uuid::Uuid::new_v4())
    }

    async fn row_count(table: &SqliteCartTable) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM cart_items")
            .fetch_one(&table.pool)
            .await
            .unwrap()
    }

    // SCT-T01: select joins the catalog and returns full product fields.
    #[tokio::test]
    async fn select_materializes_catalog_fields() {
        let (table, _) = make_table(&[make_product("p1", 4_000.0)]).await;
        let user = make_user();
        table.upsert(&user, "p1", 2).await.unwrap();

        let items = table.select_by_user(&user).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product, make_product("p1", 4_000.0));
        assert_eq!(items[0].quantity, 2);
    }

    // SCT-T02: second upsert for the same key overwrites; one row remains.
    #[tokio::test]
    async fn upsert_overwrites_quantity() {
        let (table, _) = make_table(&[make_product("p1", 1.0)]).await;
        let user = make_user();
        table.upsert(&user, "p1", 1).await.unwrap();
        table.upsert(&user, "p1", 6).await.unwrap();

        assert_eq!(row_count(&table).await, 1);
        assert_eq!(table.select_by_user(&user).await.unwrap()[0].quantity, 6);
    }

    // SCT-T03: select preserves first-insertion order across updates.
    #[tokio::test]
    async fn select_keeps_insertion_order() {
        let catalog = [make_product("a", 1.0), make_product("b", 1.0), make_product("c", 1.0)];
        let (table, _) = make_table(&catalog).await;
        let user = make_user();
        table.upsert(&user, "c", 1).await.unwrap();
        table.upsert(&user, "a", 1).await.unwrap();
        table.upsert(&user, "b", 1).await.unwrap();
        table.upsert(&user, "c", 9).await.unwrap();

        let ids: Vec<String> = table
            .select_by_user(&user)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.product.id)
            .collect();
        assert_eq!(ids, ["c", "a", "b"]);
    }

    // SCT-T04: prices come from the catalog at read time.
    #[tokio::test]
    #[expect(clippy::float_cmp, reason = "exact integer-valued literal")]
    async fn select_reflects_catalog_updates() {
        let (table, catalog) = make_table(&[make_product("p1", 1_000.0)]).await;
        let user = make_user();
        table.upsert(&user, "p1", 1).await.unwrap();
        catalog.seed(&[make_product("p1", 1_250.0)]).await.unwrap();

        let items = table.select_by_user(&user).await.unwrap();
        assert_eq!(items[0].product.price_ngn, 1_250.0);
    }

    // SCT-T05: delete and delete_by_user only touch the addressed rows.
    #[tokio::test]
    async fn deletes_are_scoped() {
        let (table, _) = make_table(&[make_product("p1", 1.0), make_product("p2", 1.0)]).await;
        let (alice, bob) = (make_user(), make_user());
        table.upsert(&alice, "p1", 1).await.unwrap();
        table.upsert(&alice, "p2", 1).await.unwrap();
        table.upsert(&bob, "p1", 4).await.unwrap();

        table.delete(&alice, "p1").await.unwrap();
        let alices = table.select_by_user(&alice).await.unwrap();
        assert_eq!(alices.len(), 1);
        assert_eq!(alices[0].id(), "p2");

        table.delete_by_user(&alice).await.unwrap();
        assert!(table.select_by_user(&alice).await.unwrap().is_empty());
        assert_eq!(table.select_by_user(&bob).await.unwrap()[0].quantity, 4);
    }

    // SCT-T06: unknown product id is a write failure and stores nothing.
    #[tokio::test]
    async fn unknown_product_is_write_failure() {
        let (table, _) = make_table(&[]).await;
        let result = table.upsert(&make_user(), "ghost", 1).await;
        assert!(
            matches!(result, Err(PersistenceError::Write { .. })),
            "expected Write failure, got {result:?}"
        );
        assert_eq!(row_count(&table).await, 0);
    }

    // SCT-T07: a user with no rows has an empty cart.
    #[tokio::test]
    async fn empty_user_cart() {
        let (table, _) = make_table(&[make_product("p1", 1.0)]).await;
        assert!(table.select_by_user(&make_user()).await.unwrap().is_empty());
    }
}
