//! Authorization-Code-with-PKCE flow engine (RFC 6749 §4.1, RFC 7636).
//!
//! ```text
//! START → BUILD_URL → WAIT_CALLBACK → EXCHANGE → DONE
//!               │            │
//!               └──fail──────┴── → ABORT
//! ```

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::browser::Browser;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use chrono::Utc;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::callback_server::{CallbackResult, CallbackServer};
use crate::crypto;
use crate::error::{AuthError, Result};
use crate::types::{PkceSession, ProviderConfig, TokenRecord};

/// Per-request / per-wait timeouts (caller-overridable defaults).
#[derive(Debug, Clone, Copy)]
pub struct PkceTimeouts {
    pub http_request: Duration,
    pub callback_wait: Duration,
}

impl Default for PkceTimeouts {
    fn default() -> Self {
        Self {
            http_request: Duration::from_secs(30),
            callback_wait: Duration::from_secs(120),
        }
    }
}

/// Runs the full Authorization-Code-with-PKCE flow against `config` and
/// returns a [`TokenRecord`] on success.
pub async fn authorize_pkce(
    config: &ProviderConfig,
    http_client: &Arc<dyn HttpClient>,
    browser: &Arc<dyn Browser>,
    timeouts: PkceTimeouts,
    cancellation: CancellationToken,
) -> Result<TokenRecord> {
    let (redirect_url, port, path) = parse_loopback_redirect(&config.redirect_uri)?;

    let server = CallbackServer::bind(port, path.clone()).await?;
    let bound_port = server.local_port()?;
    let redirect_uri = format!("{}:{}{}", redirect_url, bound_port, path);

    let session = build_session(bound_port)?;
    let auth_url = build_authorization_url(config, &session, &redirect_uri)?;

    info!(redirect_uri = %redirect_uri, "opening authorization URL");
    eprintln!("Open this URL to continue: {auth_url}");
    if let Err(e) = browser.open_url(&auth_url).await {
        warn!(error = %e, "failed to open browser automatically");
    }

    let callback = server
        .wait_for_callback(timeouts.callback_wait, cancellation.clone())
        .await?;

    let (code, state) = match callback {
        CallbackResult::Success { code, state } => (code, state),
        CallbackResult::Error { error, error_description } => {
            return Err(map_oauth_error(&error, error_description.as_deref()));
        }
    };

    if !crypto::constant_time_eq(&state, &session.state) {
        return Err(AuthError::InvalidState);
    }

    exchange_code(config, http_client, &session, &code, &redirect_uri, timeouts, cancellation).await
}

fn build_session(bound_port: u16) -> Result<PkceSession> {
    let code_verifier = crypto::random_verifier()?;
    let code_challenge = crypto::challenge(&code_verifier);
    let state = crypto::random_state(128)?;
    Ok(PkceSession {
        code_verifier,
        code_challenge,
        state,
        expected_redirect_port: bound_port,
        created_at: Utc::now(),
    })
}

fn build_authorization_url(
    config: &ProviderConfig,
    session: &PkceSession,
    redirect_uri: &str,
) -> Result<String> {
    let mut url = url::Url::parse(&config.authorization_endpoint)
        .map_err(|e| AuthError::InvalidParameter(format!("invalid authorization_endpoint: {e}")))?;

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("response_type", "code");
        query.append_pair("client_id", &config.client_id);
        query.append_pair("redirect_uri", redirect_uri);
        if let Some(scopes) = &config.scopes {
            query.append_pair("scope", scopes);
        }
        query.append_pair("state", &session.state);
        query.append_pair("code_challenge", &session.code_challenge);
        query.append_pair("code_challenge_method", "S256");
    }

    Ok(url.to_string())
}

/// Splits a `redirect_uri` into `(scheme://host, port, path)`, validating
/// it is a loopback URL.
fn parse_loopback_redirect(redirect_uri: &str) -> Result<(String, u16, String)> {
    let url = url::Url::parse(redirect_uri)
        .map_err(|e| AuthError::InvalidParameter(format!("invalid redirect_uri: {e}")))?;

    let host = url.host_str().unwrap_or_default();
    if host != "127.0.0.1" && host != "localhost" {
        return Err(AuthError::InvalidParameter(
            "redirect_uri must be a loopback address (127.0.0.1 or localhost)".to_string(),
        ));
    }

    let scheme_host = format!("{}://{}", url.scheme(), host);
    let port = url.port().unwrap_or(0);
    let path = if url.path().is_empty() { "/".to_string() } else { url.path().to_string() };

    Ok((scheme_host, port, path))
}

#[derive(Debug, Deserialize)]
struct TokenSuccessResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenErrorResponse {
    pub error: String,
    pub error_description: Option<String>,
}

async fn exchange_code(
    config: &ProviderConfig,
    http_client: &Arc<dyn HttpClient>,
    session: &PkceSession,
    code: &str,
    redirect_uri: &str,
    timeouts: PkceTimeouts,
    cancellation: CancellationToken,
) -> Result<TokenRecord> {
    let mut form: Vec<(&str, &str)> = vec![
        ("grant_type", "authorization_code"),
        ("code", code),
        ("redirect_uri", redirect_uri),
        ("code_verifier", &session.code_verifier),
    ];
    if config.client_secret.is_none() {
        form.push(("client_id", &config.client_id));
    }

    let mut request = HttpRequest::new(HttpMethod::Post, &config.token_endpoint)
        .form(&form)?
        .timeout(timeouts.http_request)
        .cancellation(cancellation);

    if let Some(secret) = &config.client_secret {
        request = request.basic_auth(&config.client_id, secret);
    }

    let response = http_client.execute(request).await.map_err(|e| {
        AuthError::ConnectionFailed(format!("token request to {} failed: {e}", config.token_endpoint))
    })?;

    if !response.is_success() {
        if let Ok(err) = response.json::<TokenErrorResponse>() {
            return Err(map_oauth_error(&err.error, err.error_description.as_deref()));
        }
        return Err(AuthError::Http(format!(
            "token endpoint returned HTTP {}",
            response.status
        )));
    }

    let body: TokenSuccessResponse = response
        .json()
        .map_err(|_| AuthError::Json("malformed token response".to_string()))?;

    let now = Utc::now();
    Ok(TokenRecord {
        access_token: body.access_token,
        token_type: body.token_type.unwrap_or_else(|| "Bearer".to_string()),
        refresh_token: body.refresh_token,
        scope: body.scope,
        expires_at: body.expires_in.map(|secs| TokenRecord::expires_at_from_expires_in(now, secs)),
        id_token: body.id_token,
    })
}

/// Maps an authorization-server `error` code to the closed error set.
pub(crate) fn map_oauth_error(error: &str, error_description: Option<&str>) -> AuthError {
    let message = match error_description {
        Some(desc) => format!("{error}: {desc}"),
        None => error.to_string(),
    };
    match error {
        "access_denied" => AuthError::AuthorizationDenied(message),
        _ => AuthError::Server(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_loopback_redirect_with_explicit_port() {
        let (scheme_host, port, path) = parse_loopback_redirect("http://127.0.0.1:8080/cb").unwrap();
        assert_eq!(scheme_host, "http://127.0.0.1");
        assert_eq!(port, 8080);
        assert_eq!(path, "/cb");
    }

    #[test]
    fn parses_loopback_redirect_with_auto_port() {
        let (_, port, path) = parse_loopback_redirect("http://127.0.0.1:0/callback").unwrap();
        assert_eq!(port, 0);
        assert_eq!(path, "/callback");
    }

    #[test]
    fn rejects_non_loopback_redirect() {
        let result = parse_loopback_redirect("https://example.com/cb");
        assert!(matches!(result, Err(AuthError::InvalidParameter(_))));
    }

    #[test]
    fn builds_authorization_url_with_pkce_params() {
        let config = ProviderConfig::new("abc", "https://as/auth", "https://as/tok")
            .with_scopes("read write");
        let session = PkceSession {
            code_verifier: "verifier".to_string(),
            code_challenge: "challenge".to_string(),
            state: "state123".to_string(),
            expected_redirect_port: 1234,
            created_at: Utc::now(),
        };
        let url = build_authorization_url(&config, &session, "http://127.0.0.1:1234/cb").unwrap();
        assert!(url.starts_with("https://as/auth?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=abc"));
        assert!(url.contains("code_challenge=challenge"));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains("state=state123"));
    }

    #[test]
    fn maps_access_denied_and_other_server_errors() {
        assert!(matches!(
            map_oauth_error("access_denied", None),
            AuthError::AuthorizationDenied(_)
        ));
        assert!(matches!(map_oauth_error("invalid_grant", None), AuthError::Server(_)));
    }
}
