// Rust guideline compliant 2026-10-16

//! Storefront cart demo.
//!
//! Seeds a small catalog in `SQLite`, then walks one shopper through a guest
//! session, a sign-in (the server cart replaces the guest cart), a few
//! server-side edits, and a sign-out (the guest cart comes back). Every
//! settled snapshot is logged.
//!
//! # Usage
//!
//! ```text
//! RUST_LOG=info cargo run --bin storefront
//!
//! # Per-operation adapter output
//! RUST_LOG=debug cargo run --bin storefront
//! ```
//!
//! `storefront.db` and the `device_storage/` directory are created in the
//! current working directory on first run. Override them with
//! `STOREFRONT_DB_URL` and `STOREFRONT_STORAGE_DIR`.

mod adapters;

use adapters::file_store::FileStore;
use adapters::sqlite;
use adapters::sqlite_cart_table::SqliteCartTable;
use adapters::sqlite_catalog::SqliteCatalog;
use adapters::watch_identity::WatchIdentity;
use anyhow::Context as _;
use cart::{CartConfig, CartSnapshot, CartStore, SyncStatus};
use domain::{CartMode, Catalog as _, Currency, Identity as _, Product, UserId};
use tokio::sync::watch;
use tracing::Instrument as _;

/// Database file created in the current working directory on first run.
const DB_URL: &str = "sqlite:storefront.db";

/// Directory standing in for the device's local storage.
const STORAGE_DIR: &str = "device_storage";

type Store = CartStore<FileStore, SqliteCartTable>;

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_owned())
}

fn product(id: &str, name: &str, category: &str, price_ngn: f64, price_usd: f64) -> Product {
    Product {
        id: id.to_owned(),
        name: name.to_owned(),
        category: category.to_owned(),
        price_ngn,
        price_usd,
        description: None,
        image: Some(format!("/images/{id}.jpg")),
        in_stock: Some(true),
        featured: Some(false),
    }
}

fn demo_catalog() -> Vec<Product> {
    vec![
        product("shea-butter", "Raw Shea Butter", "Skincare", 4_500.0, 3.0),
        product("black-soap", "African Black Soap", "Skincare", 2_500.0, 1.75),
        product("hibiscus-tea", "Dried Hibiscus Petals", "Wellness", 3_000.0, 2.0),
        product("moringa-powder", "Moringa Leaf Powder", "Wellness", 6_000.0, 4.0),
    ]
}

fn log_cart(stage: &str, snapshot: &CartSnapshot) {
    let totals = snapshot.totals();
    tracing::info!(
        stage,
        mode = ?snapshot.mode,
        lines = snapshot.items.len(),
        items = totals.total_items,
        ngn = totals.subtotal(Currency::Ngn),
        usd = totals.subtotal(Currency::Usd),
        "storefront.cart"
    );
}

/// Log every settled snapshot. Runs until the store is dropped.
async fn log_snapshots(mut rx: watch::Receiver<CartSnapshot>) {
    while rx.changed().await.is_ok() {
        let snapshot = rx.borrow_and_update().clone();
        if snapshot.status == SyncStatus::Settled {
            log_cart("settled", &snapshot);
        }
    }
}

/// Wait until the store has finished reloading in `mode`.
async fn settled_in(rx: &mut watch::Receiver<CartSnapshot>, mode: &CartMode) -> anyhow::Result<()> {
    let snapshot = rx
        .wait_for(|s| s.mode == *mode && s.status != SyncStatus::InFlight)
        .await
        .context("cart store went away")?
        .clone();
    if snapshot.status == SyncStatus::Stale {
        anyhow::bail!("cart reload failed after identity change: {:?}", snapshot.last_failure);
    }
    Ok(())
}

/// The shopper's session. Dropping `identity` on return closes the identity source.
async fn shop(
    store: &Store,
    catalog: &SqliteCatalog,
    identity: watch::Sender<Option<UserId>>,
) -> anyhow::Result<()> {
    let mut rx = store.subscribe();

    for id in ["shea-butter", "shea-butter", "black-soap"] {
        store
            .add_item_by_id(catalog, id)
            .await
            .with_context(|| format!("guest add of {id} failed"))?;
    }
    log_cart("guest", &store.snapshot());

    let user = UserId::new(uuid::Uuid::new_v4());
    tracing::info!(user_id = %user, "storefront.sign_in");
    identity.send_replace(Some(user.clone()));
    settled_in(&mut rx, &CartMode::Authenticated(user)).await?;

    store.add_item_by_id(catalog, "hibiscus-tea").await.context("remote add failed")?;
    store.add_item_by_id(catalog, "moringa-powder").await.context("remote add failed")?;
    store.set_quantity("hibiscus-tea", 3).await.context("set quantity failed")?;
    store.remove_item("moringa-powder").await.context("remove failed")?;
    log_cart("signed_in", &store.snapshot());

    tracing::info!("storefront.sign_out");
    identity.send_replace(None);
    settled_in(&mut rx, &CartMode::Guest).await?;
    log_cart("signed_out", &store.snapshot());
    drop(identity);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize the tracing subscriber before any async work.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let db_url = env_or("STOREFRONT_DB_URL", DB_URL);
    let storage_dir = env_or("STOREFRONT_STORAGE_DIR", STORAGE_DIR);

    let pool = sqlite::connect(&db_url)
        .await
        .with_context(|| format!("failed to open SQLite database {db_url}"))?;
    let catalog = SqliteCatalog::new(pool.clone());
    catalog.seed(&demo_catalog()).await.context("failed to seed catalog")?;
    let listed = catalog.products().await.context("failed to list catalog")?;
    tracing::info!(products = listed.len(), "storefront.catalog_ready");

    let device = FileStore::open(&storage_dir)
        .with_context(|| format!("failed to open device storage {storage_dir}"))?;
    let config = CartConfig::builder().build().context("failed to build cart config")?;
    let (identity_tx, mut identity) = WatchIdentity::channel(None);
    let table = SqliteCartTable::new(pool);
    let store = CartStore::new(&config, device, table, identity.current_user());
    store.refresh().await.context("initial cart load failed")?;

    // The shopper owns the identity sender; when it returns the sync loop stops.
    let session = async {
        let (shopped, ()) = tokio::join!(
            shop(&store, &catalog, identity_tx).instrument(tracing::info_span!("shopper")),
            store
                .run_identity_sync(&mut identity)
                .instrument(tracing::info_span!("identity_sync")),
        );
        shopped
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("main.shutdown: ctrl_c received");
        }
        () = log_snapshots(store.subscribe()) => {}
        result = session => {
            result?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{demo_catalog, shop};
    use crate::adapters::file_store::FileStore;
    use crate::adapters::sqlite;
    use crate::adapters::sqlite_cart_table::SqliteCartTable;
    use crate::adapters::sqlite_catalog::SqliteCatalog;
    use crate::adapters::watch_identity::WatchIdentity;
    use cart::{CartConfig, CartStore, SyncStatus};
    use domain::{CartMode, CartTable as _, UserId};
    use tempfile::TempDir;

    async fn make_store() -> (CartStore<FileStore, SqliteCartTable>, SqliteCatalog, TempDir) {
        let pool = sqlite::connect("sqlite::memory:").await.unwrap();
        let catalog = SqliteCatalog::new(pool.clone());
        catalog.seed(&demo_catalog()).await.unwrap();
        let dir = TempDir::new().unwrap();
        let store = CartStore::new(
            &CartConfig::builder().build().unwrap(),
            FileStore::open(dir.path()).unwrap(),
            SqliteCartTable::new(pool),
            None,
        );
        store.refresh().await.unwrap();
        (store, catalog, dir)
    }

    fn ids(store: &CartStore<FileStore, SqliteCartTable>) -> Vec<String> {
        store.snapshot().items.into_iter().map(|i| i.product.id).collect()
    }

    // E2E-T01: login shows only the server cart; logout brings the guest cart back.
    #[tokio::test]
    async fn login_replaces_and_logout_restores() {
        let (store, catalog, _dir) = make_store().await;
        store.add_item_by_id(&catalog, "shea-butter").await.unwrap();

        let user = UserId::new(uuid::Uuid::new_v4());
        store.table().upsert(&user, "black-soap", 2).await.unwrap();

        store.reconcile(Some(user.clone())).await.unwrap();
        assert_eq!(store.mode(), CartMode::Authenticated(user.clone()));
        assert_eq!(ids(&store), ["black-soap"]);
        assert_eq!(store.snapshot().quantity_of("black-soap"), Some(2));

        store.add_item_by_id(&catalog, "hibiscus-tea").await.unwrap();
        assert_eq!(store.table().select_by_user(&user).await.unwrap().len(), 2);

        store.reconcile(None).await.unwrap();
        assert_eq!(store.mode(), CartMode::Guest);
        assert_eq!(ids(&store), ["shea-butter"]);
        assert_eq!(store.status(), SyncStatus::Settled);
    }

    // E2E-T02: the demo session runs to completion against real adapters.
    #[tokio::test]
    async fn demo_session_completes() {
        let (store, catalog, _dir) = make_store().await;
        let (tx, mut identity) = WatchIdentity::channel(None);

        let (shopped, ()) =
            tokio::join!(shop(&store, &catalog, tx), store.run_identity_sync(&mut identity));
        shopped.unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.mode, CartMode::Guest);
        assert_eq!(snapshot.quantity_of("shea-butter"), Some(2));
        assert_eq!(snapshot.quantity_of("black-soap"), Some(1));
        assert_eq!(snapshot.items.len(), 2);
        assert_eq!(snapshot.totals().total_items, 3);
    }
}
