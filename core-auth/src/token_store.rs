//! Token store: a keyed, concurrency-safe persistent mapping from
//! `(app_name, key)` to a [`TokenRecord`], built entirely on the
//! `SecureStore` bridge trait's `set_secret` / `get_secret` / `delete_secret`
//! / `list_keys` primitives — it never assumes a concrete backend.
//!
//! ## Security
//!
//! - Tokens are serialized to JSON before storage.
//! - Token values are never logged; failures are reported without echoing
//!   secret material.
//!
//! ## Example
//!
//! ```no_run
//! use core_auth::{TokenStore, StorageKey, TokenRecord};
//! use std::sync::Arc;
//! # use bridge_traits::storage::SecureStore;
//! # async fn example(secure_store: Arc<dyn SecureStore>) -> core_auth::Result<()> {
//! let store = TokenStore::new(secure_store);
//! let key = StorageKey::new("my-app", "default");
//!
//! let token = TokenRecord {
//!     access_token: "access".to_string(),
//!     token_type: "Bearer".to_string(),
//!     refresh_token: Some("refresh".to_string()),
//!     scope: None,
//!     expires_at: None,
//!     id_token: None,
//! };
//!
//! store.put(&key, &token).await?;
//! let fetched = store.get(&key).await?;
//! store.remove(&key).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use bridge_traits::storage::SecureStore;
use tracing::{debug, warn};

use crate::error::{AuthError, Result};
use crate::types::{StorageKey, TokenRecord};

/// Persists [`TokenRecord`]s behind a [`SecureStore`] implementation.
///
/// Concurrency is delegated entirely to the underlying store: the core
/// depends only on the three primitive operations plus `list_keys`, and
/// expects operations on the same key to serialize (read-after-write
/// consistency within one process).
#[derive(Clone)]
pub struct TokenStore {
    secure_store: Arc<dyn SecureStore>,
}

impl TokenStore {
    pub fn new(secure_store: Arc<dyn SecureStore>) -> Self {
        Self { secure_store }
    }

    /// Persists `token` at `key`, overwriting any previous value.
    pub async fn put(&self, key: &StorageKey, token: &TokenRecord) -> Result<()> {
        let serialized = serde_json::to_vec(token)?;
        self.secure_store
            .set_secret(&key.storage_path(), &serialized)
            .await
            .map_err(|e| {
                warn!(app_name = %key.app_name, "failed to persist token record");
                AuthError::from(e)
            })?;
        debug!(app_name = %key.app_name, "token record persisted");
        Ok(())
    }

    /// Reads the token record at `key`, if any.
    pub async fn get(&self, key: &StorageKey) -> Result<Option<TokenRecord>> {
        let raw = self
            .secure_store
            .get_secret(&key.storage_path())
            .await
            .map_err(AuthError::from)?;

        match raw {
            Some(bytes) => {
                let record: TokenRecord = serde_json::from_slice(&bytes)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// Removes the token record at `key`. Removing a key that does not
    /// exist is not an error.
    pub async fn remove(&self, key: &StorageKey) -> Result<()> {
        self.secure_store
            .delete_secret(&key.storage_path())
            .await
            .map_err(AuthError::from)?;
        debug!(app_name = %key.app_name, "token record removed");
        Ok(())
    }

    /// True if a record is stored at `key`.
    pub async fn contains(&self, key: &StorageKey) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Lists the user-supplied `key` component of every record stored for
    /// `app_name`.
    pub async fn list_keys(&self, app_name: &str) -> Result<Vec<String>> {
        let prefix = format!("{app_name}:");
        let raw_keys = self
            .secure_store
            .list_keys(&prefix)
            .await
            .map_err(AuthError::from)?;

        Ok(raw_keys
            .into_iter()
            .filter_map(|k| k.strip_prefix(&prefix).map(str::to_string))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemorySecureStore {
        entries: Mutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl SecureStore for InMemorySecureStore {
        async fn set_secret(&self, key: &str, value: &[u8]) -> BridgeResult<()> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn get_secret(&self, key: &str) -> BridgeResult<Option<Vec<u8>>> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn delete_secret(&self, key: &str) -> BridgeResult<()> {
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }

        async fn list_keys(&self, prefix: &str) -> BridgeResult<Vec<String>> {
            Ok(self
                .entries
                .lock()
                .unwrap()
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect())
        }
    }

    fn sample_token() -> TokenRecord {
        TokenRecord {
            access_token: "A1".to_string(),
            token_type: "Bearer".to_string(),
            refresh_token: Some("R1".to_string()),
            scope: Some("read".to_string()),
            expires_at: Some(1_700_000_000),
            id_token: None,
        }
    }

    #[core_async::test]
    async fn round_trips_a_token_record() {
        let store = TokenStore::new(Arc::new(InMemorySecureStore::default()));
        let key = StorageKey::new("app1", "default");

        assert!(store.get(&key).await.unwrap().is_none());

        let token = sample_token();
        store.put(&key, &token).await.unwrap();

        let fetched = store.get(&key).await.unwrap().unwrap();
        assert_eq!(fetched, token);
        assert!(store.contains(&key).await.unwrap());

        store.remove(&key).await.unwrap();
        assert!(store.get(&key).await.unwrap().is_none());
    }

    #[core_async::test]
    async fn scopes_keys_by_app_name() {
        let store = TokenStore::new(Arc::new(InMemorySecureStore::default()));
        let key_a = StorageKey::new("app-a", "default");
        let key_b = StorageKey::new("app-b", "default");

        store.put(&key_a, &sample_token()).await.unwrap();
        store.put(&key_b, &sample_token()).await.unwrap();

        let keys_a = store.list_keys("app-a").await.unwrap();
        assert_eq!(keys_a, vec!["default".to_string()]);
    }

    #[core_async::test]
    async fn list_keys_returns_only_user_supplied_suffix() {
        let store = TokenStore::new(Arc::new(InMemorySecureStore::default()));
        store
            .put(&StorageKey::new("app1", "work"), &sample_token())
            .await
            .unwrap();
        store
            .put(&StorageKey::new("app1", "personal"), &sample_token())
            .await
            .unwrap();

        let mut keys = store.list_keys("app1").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["personal".to_string(), "work".to_string()]);
    }
}
