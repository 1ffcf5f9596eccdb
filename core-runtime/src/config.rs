//! # Core Configuration Module
//!
//! Fail-fast configuration for the OAuth core: wires the bridge ports
//! (`HttpClient`, `SecureStore`, optionally `Browser`) a `core_auth::Client`
//! depends on, together with the default timeouts, validating everything
//! up front rather than letting a flow fail midway through for a missing
//! dependency.
//!
//! ## Required bridges
//!
//! - `HttpClient` — reaches the token, device-authorization, and
//!   registration endpoints.
//! - `SecureStore` — backs the token store's persistence.
//!
//! ## Optional bridges
//!
//! - `Browser` — opens the authorization URL automatically; defaults to a
//!   no-op (the URL is always printed to the user channel regardless, so a
//!   missing browser launcher never blocks a flow).
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::AuthConfig;
//! use std::sync::Arc;
//!
//! let config = AuthConfig::builder()
//!     .app_name("my-cli")
//!     .http_client(Arc::new(MyHttpClient))
//!     .secure_store(Arc::new(MySecureStore))
//!     .build()
//!     .expect("failed to build config");
//! ```
//!
//! ### Custom timeouts
//!
//! ```ignore
//! use core_runtime::config::{AuthConfig, Timeouts};
//! use std::time::Duration;
//! use std::sync::Arc;
//!
//! let config = AuthConfig::builder()
//!     .app_name("my-cli")
//!     .http_client(Arc::new(MyHttpClient))
//!     .secure_store(Arc::new(MySecureStore))
//!     .timeouts(Timeouts {
//!         http_request: Duration::from_secs(10),
//!         ..Timeouts::default()
//!     })
//!     .build()
//!     .expect("failed to build config");
//! ```
//!
//! ## Error Handling
//!
//! The builder validates all required dependencies and provides actionable
//! error messages when a capability is missing:
//!
//! ```should_panic
//! use core_runtime::config::AuthConfig;
//!
//! // This will panic: no HttpClient or SecureStore were supplied.
//! let config = AuthConfig::builder()
//!     .app_name("my-cli")
//!     .build()
//!     .expect("Should fail - missing required bridges");
//! ```

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::browser::{Browser, NoopBrowser};
use bridge_traits::http::HttpClient;
use bridge_traits::storage::SecureStore;

use crate::error::{Error, Result};

/// Per-operation timeouts (default values, caller-overridable).
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// Per-HTTP-request timeout (default 30s).
    pub http_request: Duration,
    /// How long the loopback callback server waits for its one request
    /// (default 120s).
    pub callback_wait: Duration,
    /// Total budget for the device-code poll loop, further bounded by the
    /// server-reported `expires_in` (default 900s).
    pub device_flow_total: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            http_request: Duration::from_secs(30),
            callback_wait: Duration::from_secs(120),
            device_flow_total: Duration::from_secs(900),
        }
    }
}

/// The bridge ports and timeouts an OAuth client needs, validated up front.
///
/// Holds everything required to construct a `core_auth::Client`. Use
/// [`AuthConfigBuilder`] to build one.
#[derive(Clone)]
pub struct AuthConfig {
    /// Scopes this client's persisted tokens in the token store, so multiple
    /// applications can share one host without collisions.
    pub app_name: String,

    /// HTTP transport used to reach the token, device-authorization, and
    /// registration endpoints (required).
    pub http_client: Arc<dyn HttpClient>,

    /// Backs the token store's persistence (required).
    pub secure_store: Arc<dyn SecureStore>,

    /// Opens the authorization URL in the user's browser (optional; a
    /// no-op default is used when not provided).
    pub browser: Arc<dyn Browser>,

    /// Default timeouts, overridable per-config.
    pub timeouts: Timeouts,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("app_name", &self.app_name)
            .field("http_client", &"HttpClient { .. }")
            .field("secure_store", &"SecureStore { .. }")
            .field("browser", &"Browser { .. }")
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

impl AuthConfig {
    /// Creates a new builder for constructing an `AuthConfig`.
    pub fn builder() -> AuthConfigBuilder {
        AuthConfigBuilder::default()
    }

    /// Validates the configuration, returning an error on the first problem
    /// found.
    fn validate(&self) -> Result<()> {
        if self.app_name.trim().is_empty() {
            return Err(Error::Config("app_name cannot be empty".to_string()));
        }
        if self.timeouts.http_request.is_zero() {
            return Err(Error::Config(
                "http_request timeout must be greater than zero".to_string(),
            ));
        }
        if self.timeouts.callback_wait.is_zero() {
            return Err(Error::Config(
                "callback_wait timeout must be greater than zero".to_string(),
            ));
        }
        if self.timeouts.device_flow_total.is_zero() {
            return Err(Error::Config(
                "device_flow_total timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for constructing [`AuthConfig`] instances.
#[derive(Default)]
pub struct AuthConfigBuilder {
    app_name: Option<String>,
    http_client: Option<Arc<dyn HttpClient>>,
    secure_store: Option<Arc<dyn SecureStore>>,
    browser: Option<Arc<dyn Browser>>,
    timeouts: Timeouts,
}

impl AuthConfigBuilder {
    /// Sets the app name the token store will scope persisted tokens under.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    /// Sets the HTTP transport (required).
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the secure-credential backend the token store persists through
    /// (required).
    pub fn secure_store(mut self, store: Arc<dyn SecureStore>) -> Self {
        self.secure_store = Some(store);
        self
    }

    /// Sets the browser launcher (optional; defaults to a no-op).
    pub fn browser(mut self, browser: Arc<dyn Browser>) -> Self {
        self.browser = Some(browser);
        self
    }

    /// Overrides the default timeouts.
    pub fn timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Builds the final `AuthConfig`, validating all required dependencies
    /// are present and every value is sane.
    pub fn build(self) -> Result<AuthConfig> {
        let app_name = self.app_name.ok_or_else(|| {
            Error::Config("app_name is required. Use .app_name() to set it.".to_string())
        })?;

        let http_client = self.http_client.ok_or_else(|| Error::CapabilityMissing {
            capability: "HttpClient".to_string(),
            message: "An HttpClient implementation is required to reach the token, \
                      device-authorization, and registration endpoints."
                .to_string(),
        })?;

        let secure_store = self.secure_store.ok_or_else(|| Error::CapabilityMissing {
            capability: "SecureStore".to_string(),
            message: "A SecureStore implementation is required to back the token store. \
                      Desktop: inject an OS keychain adapter. Mobile: inject Keychain/Keystore. \
                      Tests: an in-memory SecureStore is sufficient."
                .to_string(),
        })?;

        let config = AuthConfig {
            app_name,
            http_client,
            secure_store,
            browser: self.browser.unwrap_or_else(|| Arc::new(NoopBrowser)),
            timeouts: self.timeouts,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::{HttpRequest, HttpResponse};
    use bytes::Bytes;
    use std::collections::HashMap;

    struct StubHttpClient;

    #[async_trait]
    impl HttpClient for StubHttpClient {
        async fn execute(&self, _request: HttpRequest) -> BridgeResult<HttpResponse> {
            Ok(HttpResponse {
                status: 200,
                headers: HashMap::new(),
                body: Bytes::new(),
            })
        }
    }

    struct StubSecureStore;

    #[async_trait]
    impl SecureStore for StubSecureStore {
        async fn set_secret(&self, _key: &str, _value: &[u8]) -> BridgeResult<()> {
            Ok(())
        }
        async fn get_secret(&self, _key: &str) -> BridgeResult<Option<Vec<u8>>> {
            Ok(None)
        }
        async fn delete_secret(&self, _key: &str) -> BridgeResult<()> {
            Ok(())
        }
        async fn list_keys(&self, _prefix: &str) -> BridgeResult<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn builder_requires_app_name() {
        let result = AuthConfig::builder()
            .http_client(Arc::new(StubHttpClient))
            .secure_store(Arc::new(StubSecureStore))
            .build();

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("app_name is required"));
    }

    #[test]
    fn builder_requires_http_client() {
        let result = AuthConfig::builder()
            .app_name("my-cli")
            .secure_store(Arc::new(StubSecureStore))
            .build();

        assert!(result.is_err());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("HttpClient"));
    }

    #[test]
    fn builder_requires_secure_store() {
        let result = AuthConfig::builder()
            .app_name("my-cli")
            .http_client(Arc::new(StubHttpClient))
            .build();

        assert!(result.is_err());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("SecureStore"));
    }

    #[test]
    fn builder_succeeds_with_required_fields_and_default_timeouts() {
        let config = AuthConfig::builder()
            .app_name("my-cli")
            .http_client(Arc::new(StubHttpClient))
            .secure_store(Arc::new(StubSecureStore))
            .build()
            .unwrap();

        assert_eq!(config.app_name, "my-cli");
        assert_eq!(config.timeouts.http_request, Duration::from_secs(30));
        assert_eq!(config.timeouts.callback_wait, Duration::from_secs(120));
        assert_eq!(config.timeouts.device_flow_total, Duration::from_secs(900));
    }

    #[test]
    fn builder_rejects_empty_app_name() {
        let result = AuthConfig::builder()
            .app_name("   ")
            .http_client(Arc::new(StubHttpClient))
            .secure_store(Arc::new(StubSecureStore))
            .build();

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("app_name cannot be empty"));
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        let result = AuthConfig::builder()
            .app_name("my-cli")
            .http_client(Arc::new(StubHttpClient))
            .secure_store(Arc::new(StubSecureStore))
            .timeouts(Timeouts {
                http_request: Duration::ZERO,
                ..Timeouts::default()
            })
            .build();

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("http_request timeout must be greater than zero"));
    }

    #[test]
    fn builder_accepts_custom_timeouts() {
        let config = AuthConfig::builder()
            .app_name("my-cli")
            .http_client(Arc::new(StubHttpClient))
            .secure_store(Arc::new(StubSecureStore))
            .timeouts(Timeouts {
                http_request: Duration::from_secs(5),
                callback_wait: Duration::from_secs(60),
                device_flow_total: Duration::from_secs(300),
            })
            .build()
            .unwrap();

        assert_eq!(config.timeouts.http_request, Duration::from_secs(5));
        assert_eq!(config.timeouts.callback_wait, Duration::from_secs(60));
        assert_eq!(config.timeouts.device_flow_total, Duration::from_secs(300));
    }

    #[test]
    fn defaults_to_noop_browser_when_not_supplied() {
        let config = AuthConfig::builder()
            .app_name("my-cli")
            .http_client(Arc::new(StubHttpClient))
            .secure_store(Arc::new(StubSecureStore))
            .build()
            .unwrap();

        // NoopBrowser always succeeds; this exercises the default wiring.
        assert!(core_async::runtime::block_on(config.browser.open_url("https://example.com")).is_ok());
    }

    #[test]
    fn config_is_cloneable() {
        let config = AuthConfig::builder()
            .app_name("my-cli")
            .http_client(Arc::new(StubHttpClient))
            .secure_store(Arc::new(StubSecureStore))
            .build()
            .unwrap();

        let cloned = config.clone();
        assert_eq!(cloned.app_name, config.app_name);
    }
}
