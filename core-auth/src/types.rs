//! Data model: the value types the flow engines and token store operate on.
//!
//! [`ProviderConfig`] and [`TokenRecord`] are the long-lived, serializable
//! types; [`PkceSession`] and [`DeviceSession`] are flow-local and ephemeral
//! — both are zeroed on drop since they carry the `code_verifier` / raw
//! `state` the flow depends on for its security properties.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Skew applied to `expires_at` comparisons, guarding against clock jitter
/// and the round-trip latency of the request that is about to use the
/// token.
pub const EXPIRY_SKEW_SECONDS: i64 = 30;

/// Default device/PKCE polling interval when a server omits `interval`.
pub const DEFAULT_DEVICE_POLL_INTERVAL_SECS: u64 = 5;

/// Immutable provider configuration: the endpoints and client identity a
/// flow is run against.
///
/// Constructed once and shared by reference across flows; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub client_id: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    /// Presence gates whether the device flow is usable.
    pub device_authorization_endpoint: Option<String>,
    /// For the loopback flow this must be `http://127.0.0.1:<port>/…` or
    /// `http://localhost:<port>/…`; port `0` means "let the OS assign one".
    pub redirect_uri: String,
    /// Space-delimited scope string, passed through verbatim.
    pub scopes: Option<String>,
    /// Absence implies a public client relying solely on PKCE.
    pub client_secret: Option<String>,
}

impl ProviderConfig {
    /// Builds a config for a provider with explicit endpoints.
    pub fn new(
        client_id: impl Into<String>,
        authorization_endpoint: impl Into<String>,
        token_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            authorization_endpoint: authorization_endpoint.into(),
            token_endpoint: token_endpoint.into(),
            device_authorization_endpoint: None,
            redirect_uri: "http://127.0.0.1:0/callback".to_string(),
            scopes: None,
            client_secret: None,
        }
    }

    pub fn with_device_authorization_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.device_authorization_endpoint = Some(endpoint.into());
        self
    }

    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = redirect_uri.into();
        self
    }

    pub fn with_scopes(mut self, scopes: impl Into<String>) -> Self {
        self.scopes = Some(scopes.into());
        self
    }

    pub fn with_client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    /// Well-known GitHub OAuth app endpoints.
    pub fn github(client_id: impl Into<String>) -> Self {
        Self::new(
            client_id,
            "https://github.com/login/oauth/authorize",
            "https://github.com/login/oauth/access_token",
        )
        .with_scopes("read:user")
    }

    /// Well-known Google OAuth endpoints, including device authorization.
    pub fn google(client_id: impl Into<String>) -> Self {
        Self::new(
            client_id,
            "https://accounts.google.com/o/oauth2/v2/auth",
            "https://oauth2.googleapis.com/token",
        )
        .with_device_authorization_endpoint("https://oauth2.googleapis.com/device/code")
        .with_scopes("openid email profile")
    }

    /// True when the config has no client secret (PKCE-only public client).
    pub fn is_public_client(&self) -> bool {
        self.client_secret.is_none()
    }

    /// True when `device_authorization_endpoint` is configured.
    pub fn supports_device_flow(&self) -> bool {
        self.device_authorization_endpoint.is_some()
    }
}

/// An immutable bearer-credential bundle. A refresh never mutates a
/// `TokenRecord` in place — it produces a new one.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Absolute Unix-epoch seconds. `None` means "unknown / never expires
    /// from this library's perspective".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl std::fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRecord")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("scope", &self.scope)
            .field("expires_at", &self.expires_at)
            .field("id_token", &self.id_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl TokenRecord {
    /// True iff `expires_at` is set and `now >= expires_at - skew`.
    /// An unset `expires_at` is treated as never expiring.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now.timestamp() >= expires_at - EXPIRY_SKEW_SECONDS,
            None => false,
        }
    }

    /// Builds the `expires_at` field from a server-reported `expires_in`
    /// (seconds), anchored to `received_at`.
    pub fn expires_at_from_expires_in(received_at: DateTime<Utc>, expires_in: i64) -> i64 {
        received_at.timestamp() + expires_in
    }
}

/// `(app_name, user_supplied_key)`: scopes the token store by application so
/// multiple apps on one host never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageKey {
    pub app_name: String,
    pub key: String,
}

impl StorageKey {
    pub fn new(app_name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            key: key.into(),
        }
    }

    /// The flat string representation used as the actual `SecureStore` key.
    pub fn storage_path(&self) -> String {
        format!("{}:{}", self.app_name, self.key)
    }
}

/// Ephemeral, single-use PKCE session state. Zeroed on drop: `code_verifier`
/// and `state` are the security-relevant secrets of the flow.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PkceSession {
    pub code_verifier: String,
    #[zeroize(skip)]
    pub code_challenge: String,
    pub state: String,
    #[zeroize(skip)]
    pub expected_redirect_port: u16,
    #[zeroize(skip)]
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for PkceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkceSession")
            .field("code_verifier", &"<redacted>")
            .field("code_challenge", &self.code_challenge)
            .field("state", &"<redacted>")
            .field("expected_redirect_port", &self.expected_redirect_port)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Ephemeral device-code-flow session state, alive only for the duration of
/// one `authorize_device` call.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DeviceSession {
    pub device_code: String,
    #[zeroize(skip)]
    pub user_code: String,
    #[zeroize(skip)]
    pub verification_uri: String,
    #[zeroize(skip)]
    pub verification_uri_complete: Option<String>,
    /// Absolute Unix-epoch seconds.
    #[zeroize(skip)]
    pub expires_at: i64,
    /// Seconds, mutated upward in place by `slow_down` responses during the
    /// poll loop.
    #[zeroize(skip)]
    pub interval: u64,
}

impl DeviceSession {
    pub fn interval_duration(&self) -> Duration {
        Duration::from_secs(self.interval.max(1))
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.expires_at
    }
}

impl std::fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("device_code", &"<redacted>")
            .field("user_code", &self.user_code)
            .field("verification_uri", &self.verification_uri)
            .field("verification_uri_complete", &self.verification_uri_complete)
            .field("expires_at", &self.expires_at)
            .field("interval", &self.interval)
            .finish()
    }
}

/// Response from a dynamic client registration request (RFC 7591 §3.2.1).
/// Fields beyond the ones named explicitly are retained opaquely in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationResponse {
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id_issued_at: Option<i64>,
    /// `0` means "never expires".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret_expires_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_client_uri: Option<String>,
    /// Any metadata fields the server returned beyond the ones above,
    /// preserved opaquely for round-tripping.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A method descriptor inside a [`FormulaDoc`]: the method's name and the
/// set of caller-supplied input names it requires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormulaMethod {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<String>,
}

/// Declarative provider descriptor: the endpoints a provider exposes and
/// the methods it supports. This is the input to `script_from_formula` /
/// `script_resolve_from_formula`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormulaDoc {
    pub name: String,
    pub endpoints: FormulaEndpoints,
    pub methods: Vec<FormulaMethod>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormulaEndpoints {
    pub authorization: String,
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_authorization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration: Option<String>,
}

/// The result of binding one [`FormulaMethod`] and its parameters to a
/// [`FormulaDoc`]: a ready-to-execute, fully-resolved request.
///
/// This is treated as an internal canonical form — its JSON shape is not a
/// documented external contract, only the fields the flow engines read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedScript {
    pub version: u32,
    pub method: String,
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
    pub endpoints: FormulaEndpoints,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn token_record_expiry_respects_skew() {
        let t = TokenRecord {
            access_token: "a".into(),
            token_type: "Bearer".into(),
            refresh_token: None,
            scope: None,
            expires_at: Some(1_000),
            id_token: None,
        };
        assert!(!t.is_expired(Utc.timestamp_opt(1_000 - 31, 0).unwrap()));
        assert!(t.is_expired(Utc.timestamp_opt(1_000 - 29, 0).unwrap()));
    }

    #[test]
    fn token_record_without_expiry_never_expires() {
        let t = TokenRecord {
            access_token: "a".into(),
            token_type: "Bearer".into(),
            refresh_token: None,
            scope: None,
            expires_at: None,
            id_token: None,
        };
        assert!(!t.is_expired(Utc::now()));
    }

    #[test]
    fn storage_key_formats_as_app_colon_key() {
        let k = StorageKey::new("myapp", "default");
        assert_eq!(k.storage_path(), "myapp:default");
    }

    #[test]
    fn provider_config_presets_are_well_formed() {
        let gh = ProviderConfig::github("client123");
        assert!(gh.is_public_client());
        assert!(!gh.supports_device_flow());

        let g = ProviderConfig::google("client456");
        assert!(g.supports_device_flow());
    }

    #[test]
    fn token_record_serializes_without_optional_fields() {
        let t = TokenRecord {
            access_token: "a".into(),
            token_type: "Bearer".into(),
            refresh_token: None,
            scope: None,
            expires_at: None,
            id_token: None,
        };
        let json = serde_json::to_string(&t).unwrap();
        assert!(!json.contains("refresh_token"));
        assert!(!json.contains("expires_at"));
    }

    #[test]
    fn token_record_round_trips_through_json() {
        let t = TokenRecord {
            access_token: "A2".into(),
            token_type: "Bearer".into(),
            refresh_token: Some("R1".into()),
            scope: Some("read".into()),
            expires_at: Some(1_700_000_000),
            id_token: None,
        };
        let json = serde_json::to_string(&t).unwrap();
        let back: TokenRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(t, back);
    }
}
