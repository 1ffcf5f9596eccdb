//! Secure credential storage abstraction.

use async_trait::async_trait;

use crate::error::Result;

/// Secure credential storage trait
///
/// Abstracts secure storage mechanisms:
/// - macOS/iOS: Keychain
/// - Android: Keystore (hardware-backed when available)
/// - Windows: DPAPI
/// - Linux: Secret Service / libsecret
/// - Web: WebCrypto + encrypted localStorage/IndexedDB
///
/// The token store (`core_auth::token_store`) is built entirely on this trait's
/// three primitive operations plus `list_keys`; it never assumes a concrete
/// backend.
///
/// # Security Requirements
///
/// Implementations MUST:
/// - Encrypt data at rest
/// - Use platform-provided secure storage when available
/// - Never log or expose sensitive data
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SecureStore;
///
/// async fn store_token(store: &dyn SecureStore, token: &str) -> Result<()> {
///     store.set_secret("oauth_token", token.as_bytes()).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SecureStore: Send + Sync {
    /// Store a secret value, overwriting any previous value at `key`.
    async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Retrieve a secret value.
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Delete a secret. Deleting a key that does not exist is not an error.
    async fn delete_secret(&self, key: &str) -> Result<()>;

    /// Check if a secret exists without retrieving it.
    async fn has_secret(&self, key: &str) -> Result<bool> {
        Ok(self.get_secret(key).await?.is_some())
    }

    /// List all secret keys (without values), optionally scoped to those
    /// sharing a `prefix`. Used by the token store's `list_keys(app_name)`.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemorySecureStore {
        entries: Mutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl SecureStore for InMemorySecureStore {
        async fn set_secret(&self, key: &str, value: &[u8]) -> Result<()> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn get_secret(&self, key: &str) -> Result<Option<Vec<u8>>> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn delete_secret(&self, key: &str) -> Result<()> {
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }

        async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
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

    #[core_async::test]
    async fn round_trips_a_secret() {
        let store = InMemorySecureStore::default();
        store.set_secret("a", b"hello").await.unwrap();
        assert_eq!(store.get_secret("a").await.unwrap(), Some(b"hello".to_vec()));
        assert!(store.has_secret("a").await.unwrap());
        store.delete_secret("a").await.unwrap();
        assert_eq!(store.get_secret("a").await.unwrap(), None);
    }

    #[core_async::test]
    async fn list_keys_filters_by_prefix() {
        let store = InMemorySecureStore::default();
        store.set_secret("app1:k1", b"x").await.unwrap();
        store.set_secret("app2:k1", b"y").await.unwrap();
        let keys = store.list_keys("app1:").await.unwrap();
        assert_eq!(keys, vec!["app1:k1".to_string()]);
    }
}
