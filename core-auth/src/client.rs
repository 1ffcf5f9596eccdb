//! The `Client`: a provider configuration bound to its flow dispatch and a
//! token store handle.
//!
//! Only one flow may run at a time per client instance — a second
//! concurrent call fails fast with `INVALID_STATE` rather than queuing or
//! silently aborting the first.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bridge_traits::browser::{Browser, NoopBrowser};
use bridge_traits::http::HttpClient;
use tokio_util::sync::CancellationToken;

use crate::device::{self, DeviceTimeouts};
use crate::error::{AuthError, Result};
use crate::formula::script_resolve_from_formula;
use crate::pkce::{self, PkceTimeouts};
use crate::refresh;
use crate::token_store::TokenStore;
use crate::types::{FormulaDoc, ProviderConfig, ResolvedScript, StorageKey, TokenRecord};

/// Default timeouts, caller-overridable.
#[derive(Debug, Clone, Copy)]
pub struct ClientTimeouts {
    pub http_request: Duration,
    pub callback_wait: Duration,
    pub device_flow_total: Duration,
}

impl Default for ClientTimeouts {
    fn default() -> Self {
        Self {
            http_request: Duration::from_secs(30),
            callback_wait: Duration::from_secs(120),
            device_flow_total: device::DEFAULT_DEVICE_FLOW_TIMEOUT,
        }
    }
}

/// A provider-bound OAuth client: owns one [`ProviderConfig`], the HTTP
/// transport, an optional browser launcher, and a handle to the token
/// store.
///
/// `app_name` scopes every token this client saves, loads, or forgets, so
/// multiple applications sharing one host's token store never collide.
pub struct Client {
    app_name: String,
    config: ProviderConfig,
    http_client: Arc<dyn HttpClient>,
    browser: Arc<dyn Browser>,
    token_store: Arc<TokenStore>,
    timeouts: ClientTimeouts,
    flow_in_progress: AtomicBool,
}

impl Client {
    pub fn new(
        app_name: impl Into<String>,
        config: ProviderConfig,
        http_client: Arc<dyn HttpClient>,
        token_store: Arc<TokenStore>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            config,
            http_client,
            browser: Arc::new(NoopBrowser),
            token_store,
            timeouts: ClientTimeouts::default(),
            flow_in_progress: AtomicBool::new(false),
        }
    }

    pub fn with_browser(mut self, browser: Arc<dyn Browser>) -> Self {
        self.browser = browser;
        self
    }

    pub fn with_timeouts(mut self, timeouts: ClientTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// A [`Client`] preconfigured for GitHub's well-known endpoints.
    pub fn github(
        client_id: impl Into<String>,
        app_name: impl Into<String>,
        http_client: Arc<dyn HttpClient>,
        token_store_backend: Arc<dyn bridge_traits::storage::SecureStore>,
    ) -> Self {
        Self::new(
            app_name,
            ProviderConfig::github(client_id),
            http_client,
            Arc::new(TokenStore::new(token_store_backend)),
        )
    }

    /// A [`Client`] preconfigured for Google's well-known endpoints
    /// (includes device-flow support).
    pub fn google(
        client_id: impl Into<String>,
        app_name: impl Into<String>,
        http_client: Arc<dyn HttpClient>,
        token_store_backend: Arc<dyn bridge_traits::storage::SecureStore>,
    ) -> Self {
        Self::new(
            app_name,
            ProviderConfig::google(client_id),
            http_client,
            Arc::new(TokenStore::new(token_store_backend)),
        )
    }

    /// The app name this client's persisted tokens are scoped under.
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn provider_config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Runs the Authorization-Code-with-PKCE flow to completion.
    pub async fn authorize_pkce(&self, cancellation: CancellationToken) -> Result<TokenRecord> {
        let _guard = self.begin_flow()?;
        let timeouts = PkceTimeouts {
            http_request: self.timeouts.http_request,
            callback_wait: self.timeouts.callback_wait,
        };
        pkce::authorize_pkce(&self.config, &self.http_client, &self.browser, timeouts, cancellation).await
    }

    /// Runs the device authorization grant flow to completion.
    /// Requires `device_authorization_endpoint` to be configured.
    pub async fn authorize_device(&self, cancellation: CancellationToken) -> Result<TokenRecord> {
        let _guard = self.begin_flow()?;
        let timeouts = DeviceTimeouts {
            http_request: self.timeouts.http_request,
            total: self.timeouts.device_flow_total,
        };
        device::authorize_device(&self.config, &self.http_client, &self.browser, timeouts, cancellation).await
    }

    /// Exchanges `refresh_token` for a fresh [`TokenRecord`].
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenRecord> {
        refresh::refresh(&self.config, &self.http_client, refresh_token, self.timeouts.http_request).await
    }

    /// Validates `script` is compatible with this client's endpoints, then
    /// dispatches to the matching flow engine.
    pub async fn run_script(&self, script: &ResolvedScript, cancellation: CancellationToken) -> Result<TokenRecord> {
        if script.endpoints.authorization != self.config.authorization_endpoint
            || script.endpoints.token != self.config.token_endpoint
        {
            return Err(AuthError::InvalidParameter(
                "script endpoints do not match this client's provider configuration".to_string(),
            ));
        }

        match script.method.as_str() {
            "authorization_code" => self.authorize_pkce(cancellation).await,
            "device_code" => self.authorize_device(cancellation).await,
            other => Err(AuthError::Unsupported(format!("unsupported script method: {other}"))),
        }
    }

    /// Binds `method` against `formula` and runs it immediately.
    pub async fn run_formula_method(
        &self,
        formula: &FormulaDoc,
        method: &str,
        cancellation: CancellationToken,
    ) -> Result<TokenRecord> {
        let script = script_resolve_from_formula(
            formula,
            method,
            self.config.client_id.clone(),
            self.config.client_secret.clone(),
            self.config.scopes.clone(),
            Some(self.config.redirect_uri.clone()),
        )?;
        self.run_script(&script, cancellation).await
    }

    /// Persists `token` under `key`, scoped to this client's `app_name`.
    pub async fn save(&self, key: &str, token: &TokenRecord) -> Result<()> {
        self.token_store.put(&StorageKey::new(&self.app_name, key), token).await
    }

    /// Loads a previously persisted token, if any.
    pub async fn load(&self, key: &str) -> Result<Option<TokenRecord>> {
        self.token_store.get(&StorageKey::new(&self.app_name, key)).await
    }

    /// Removes a persisted token.
    pub async fn forget(&self, key: &str) -> Result<()> {
        self.token_store.remove(&StorageKey::new(&self.app_name, key)).await
    }

    fn begin_flow(&self) -> Result<FlowGuard<'_>> {
        if self
            .flow_in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(AuthError::InvalidState);
        }
        Ok(FlowGuard { client: self })
    }
}

/// Releases the single-flow-per-instance guard when the flow ends, however
/// it ends (success, error, or the caller dropping the future early).
struct FlowGuard<'a> {
    client: &'a Client,
}

impl Drop for FlowGuard<'_> {
    fn drop(&mut self) {
        self.client.flow_in_progress.store(false, Ordering::SeqCst);
    }
}
