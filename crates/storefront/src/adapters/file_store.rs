// Rust guideline compliant 2026-10-16

//! File-backed `KeyValueStore`: one `<key>.json` file per key in a directory.
//!
//! Stands in for device-local storage of the guest cart. Writes go to a
//! temporary sibling first and are renamed into place, so a crash mid-write
//! leaves the previous value intact.

use std::io;
use std::path::{Path, PathBuf};

use domain::{KeyValueStore, PersistenceError};

/// `KeyValueStore` over plain files in one directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Use `dir` as the storage directory, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns the `io::Error` from directory creation.
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        tracing::debug!(dir = %dir.display(), "file_store.opened");
        Ok(Self { dir })
    }

    /// The storage directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // Keys become file names; anything outside [A-Za-z0-9_-] is replaced.
    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                tracing::error!(key, "file_store.get: {e}");
                Err(PersistenceError::Read { reason: e.to_string() })
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)
            .and_then(|()| std::fs::rename(&tmp, &path))
            .map_err(|e| {
                tracing::error!(key, "file_store.set: {e}");
                PersistenceError::Write { reason: e.to_string() }
            })
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                tracing::error!(key, "file_store.remove: {e}");
                Err(PersistenceError::Write { reason: e.to_string() })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FileStore;
    use cart::LocalAdapter;
    use domain::{CartAdapter as _, KeyValueStore as _, PersistenceError, Product};
    use tempfile::TempDir;

    fn test_store() -> (FileStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path()).unwrap();
        (store, temp)
    }

    fn make_product(id: &str) -> Product {
        Product {
            id: id.to_owned(),
            name: format!("Product {id}"),
            category: "Bodycare".to_owned(),
            price_ngn: 2_000.0,
            price_usd: 1.5,
            description: None,
            image: None,
            in_stock: None,
            featured: None,
        }
    }

    // FS-T01: get on a missing key is None; set then get returns the value.
    #[test]
    fn set_then_get() {
        let (store, tmp) = test_store();
        assert_eq!(store.get("guestCart").unwrap(), None);

        store.set("guestCart", "[]").unwrap();
        assert_eq!(store.get("guestCart").unwrap().as_deref(), Some("[]"));
        assert!(tmp.path().join("guestCart.json").exists());
    }

    // FS-T02: remove deletes the file; removing again is not an error.
    #[test]
    fn remove_is_idempotent() {
        let (store, tmp) = test_store();
        store.set("k", "v").unwrap();

        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    // FS-T03: keys with path separators stay inside the directory.
    #[test]
    fn key_is_sanitized() {
        let (store, tmp) = test_store();
        store.set("../escape", "x").unwrap();

        assert!(tmp.path().join("___escape.json").exists());
        assert_eq!(store.get("../escape").unwrap().as_deref(), Some("x"));
    }

    // FS-T04: a directory where the file should be is a read failure.
    #[test]
    fn unreadable_entry_is_read_failure() {
        let (store, tmp) = test_store();
        std::fs::create_dir(tmp.path().join("blocked.json")).unwrap();

        assert!(matches!(store.get("blocked"), Err(PersistenceError::Read { .. })));
    }

    // FS-T05: a guest cart written through LocalAdapter survives reopening.
    #[tokio::test]
    async fn guest_cart_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        {
            let local = LocalAdapter::new(FileStore::open(tmp.path()).unwrap(), "guestCart");
            local.upsert_item(&make_product("p1"), 2).await.unwrap();
        }

        let reopened = LocalAdapter::new(FileStore::open(tmp.path()).unwrap(), "guestCart");
        let items = reopened.load().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id(), "p1");
        assert_eq!(items[0].quantity, 2);
    }
}
