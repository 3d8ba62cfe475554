//! Cart persisted between runs as a JSON file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use vitrine_core::Cart;

use crate::error::ClientError;

/// File-backed cart storage.
///
/// An empty cart is stored as the absence of the file.
#[derive(Debug, Clone)]
pub struct CartStore {
    path: PathBuf,
}

impl CartStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored cart. A missing file is an empty cart.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] if the file cannot be read or does not
    /// hold a cart.
    pub async fn load(&self) -> Result<Cart, ClientError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Cart::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Store `cart`, replacing the previous contents.
    ///
    /// The file is written next to its destination and renamed into place so
    /// a crash never leaves a truncated cart behind.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] on I/O failure.
    pub async fn save(&self, cart: &Cart) -> Result<(), ClientError> {
        if cart.is_empty() {
            return self.clear().await;
        }

        let json = serde_json::to_vec_pretty(cart)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::debug!(path = %self.path.display(), lines = cart.lines().len(), "Cart saved");
        Ok(())
    }

    /// Remove the stored cart.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] on I/O failure other than the file
    /// already being gone.
    pub async fn clear(&self) -> Result<(), ClientError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;
    use vitrine_core::ProductId;

    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_empty_cart() {
        let dir = tempfile::tempdir().unwrap();
        let store = CartStore::new(dir.path().join("cart.json"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = CartStore::new(dir.path().join("cart.json"));

        let mut cart = Cart::new();
        cart.add(ProductId::new(1), dec!(49.90), 2).unwrap();
        cart.add(ProductId::new(7), dec!(12.50), 1).unwrap();
        store.save(&cart).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.item_count(), 3);
        assert_eq!(loaded.subtotal(), dec!(112.30));
        assert!(!dir.path().join("cart.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_saving_empty_cart_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");
        let store = CartStore::new(&path);

        let mut cart = Cart::new();
        cart.add(ProductId::new(1), dec!(10), 1).unwrap();
        store.save(&cart).await.unwrap();
        assert!(path.exists());

        store.save(&Cart::new()).await.unwrap();
        assert!(!path.exists());
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = CartStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, ClientError::Storage(_)));
    }
}
