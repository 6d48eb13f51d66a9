// Rust guideline compliant 2026-10-12

//! Server-resident adapter for the `CartAdapter` port.
//!
//! Scopes a shared `CartTable` to one shopper. Lines are materialized from the
//! catalog at load time, so names and prices reflect the current catalog.

use domain::{CartAdapter, CartItem, CartTable, PersistenceError, Product, UserId};

/// `CartAdapter` over the rows of a single user in a `CartTable`.
#[derive(Debug)]
pub struct RemoteAdapter<'a, T: CartTable> {
    table: &'a T,
    user: UserId,
}

impl<'a, T: CartTable> RemoteAdapter<'a, T> {
    /// Scope `table` to the rows owned by `user`.
    #[must_use]
    pub fn new(table: &'a T, user: UserId) -> Self {
        Self { table, user }
    }

    #[must_use]
    pub fn user(&self) -> &UserId {
        &self.user
    }
}

impl<T: CartTable> CartAdapter for RemoteAdapter<'_, T> {
    async fn load(&self) -> Result<Vec<CartItem>, PersistenceError> {
        let items = self.table.select_by_user(&self.user).await?;
        tracing::debug!(user_id = %self.user, lines = items.len(), "remote_adapter.load");
        Ok(items)
    }

    /// Only the product id is sent; the server re-joins the catalog on load.
    async fn upsert_item(&self, product: &Product, quantity: u32) -> Result<(), PersistenceError> {
        self.table.upsert(&self.user, &product.id, quantity).await
    }

    async fn remove_item(&self, product_id: &str) -> Result<(), PersistenceError> {
        self.table.delete(&self.user, product_id).await
    }

    /// Deletes this user's rows only.
    async fn clear(&self) -> Result<(), PersistenceError> {
        self.table.delete_by_user(&self.user).await
    }
}

#[cfg(test)]
mod tests {
    use super::RemoteAdapter;
    use domain::{CartAdapter as _, CartItem, CartTable, PersistenceError, Product, UserId};
    use std::cell::RefCell;

    /// Row store keyed by `(user, product_id)`; joins against a fixed catalog.
    struct MockTable {
        catalog: Vec<Product>,
        rows: RefCell<Vec<(UserId, String, u32)>>,
    }

    impl CartTable for MockTable {
        async fn select_by_user(&self, user: &UserId) -> Result<Vec<CartItem>, PersistenceError> {
            Ok(self
                .rows
                .borrow()
                .iter()
                .filter(|(u, _, _)| u == user)
                .filter_map(|(_, pid, q)| {
                    self.catalog
                        .iter()
                        .find(|p| &p.id == pid)
                        .map(|p| CartItem::new(p.clone(), *q))
                })
                .collect())
        }

        async fn upsert(
            &self,
            user: &UserId,
            product_id: &str,
            quantity: u32,
        ) -> Result<(), PersistenceError> {
            let mut rows = self.rows.borrow_mut();
            match rows.iter_mut().find(|(u, p, _)| u == user && p == product_id) {
                Some(row) => row.2 = quantity,
                None => rows.push((user.clone(), product_id.to_owned(), quantity)),
            }
            Ok(())
        }

        async fn delete(&self, user: &UserId, product_id: &str) -> Result<(), PersistenceError> {
            self.rows.borrow_mut().retain(|(u, p, _)| !(u == user && p == product_id));
            Ok(())
        }

        async fn delete_by_user(&self, user: &UserId) -> Result<(), PersistenceError> {
            self.rows.borrow_mut().retain(|(u, _, _)| u != user);
            Ok(())
        }
    }

    fn make_product(id: &str, price_ngn: f64) -> Product {
        Product {
            id: id.to_owned(),
            name: format!("Product {id}"),
            category: "Test".to_owned(),
            price_ngn,
            price_usd: 1.0,
            description: None,
            image: None,
            in_stock: None,
            featured: None,
        }
    }

    fn make_user() -> UserId {
        UserId::new(uuid::Uuid::new_v4())
    }

    // RA-T01: operations only touch the scoped user's rows.
    #[tokio::test]
    async fn scoped_to_one_user() {
        let table = MockTable {
            catalog: vec![make_product("p1", 100.0), make_product("p2", 200.0)],
            rows: RefCell::new(vec![]),
        };
        let alice = RemoteAdapter::new(&table, make_user());
        let bob = RemoteAdapter::new(&table, make_user());

        alice.upsert_item(&make_product("p1", 100.0), 2).await.unwrap();
        bob.upsert_item(&make_product("p2", 200.0), 1).await.unwrap();
        alice.clear().await.unwrap();

        assert!(alice.load().await.unwrap().is_empty());
        let bobs = bob.load().await.unwrap();
        assert_eq!(bobs.len(), 1);
        assert_eq!(bobs[0].id(), "p2");
    }

    // RA-T02: load reflects the catalog at read time, not the product passed at add time.
    #[tokio::test]
    #[expect(clippy::float_cmp, reason = "exact integer-valued literal")]
    async fn load_uses_current_catalog_fields() {
        let table = MockTable {
            catalog: vec![make_product("p1", 999.0)],
            rows: RefCell::new(vec![]),
        };
        let adapter = RemoteAdapter::new(&table, make_user());
        adapter.upsert_item(&make_product("p1", 100.0), 3).await.unwrap();

        let items = adapter.load().await.unwrap();
        assert_eq!(items[0].product.price_ngn, 999.0);
        assert_eq!(items[0].quantity, 3);
    }

    // RA-T03: remove_item deletes exactly one row.
    #[tokio::test]
    async fn remove_item_deletes_row() {
        let table = MockTable {
            catalog: vec![make_product("p1", 1.0), make_product("p2", 1.0)],
            rows: RefCell::new(vec![]),
        };
        let adapter = RemoteAdapter::new(&table, make_user());
        adapter.upsert_item(&make_product("p1", 1.0), 1).await.unwrap();
        adapter.upsert_item(&make_product("p2", 1.0), 1).await.unwrap();
        adapter.remove_item("p1").await.unwrap();

        let items = adapter.load().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id(), "p2");
    }
}
