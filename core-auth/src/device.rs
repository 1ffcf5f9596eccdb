//! RFC 8628 Device Authorization Grant flow engine.

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::browser::Browser;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use chrono::Utc;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::{AuthError, Result};
use crate::pkce::{map_oauth_error, TokenErrorResponse};
use crate::types::{DeviceSession, ProviderConfig, TokenRecord, DEFAULT_DEVICE_POLL_INTERVAL_SECS};

/// Default device flow total timeout, further bounded by the
/// server-reported `expires_in`.
pub const DEFAULT_DEVICE_FLOW_TIMEOUT: Duration = Duration::from_secs(900);

/// How much the poll interval grows, permanently for the session, each time
/// the server responds `slow_down`.
const SLOW_DOWN_INCREMENT_SECS: u64 = 5;

#[derive(Debug, Clone, Copy)]
pub struct DeviceTimeouts {
    pub http_request: Duration,
    pub total: Duration,
}

impl Default for DeviceTimeouts {
    fn default() -> Self {
        Self {
            http_request: Duration::from_secs(30),
            total: DEFAULT_DEVICE_FLOW_TIMEOUT,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DeviceAuthorizationResponse {
    device_code: String,
    user_code: String,
    verification_uri: String,
    #[serde(default)]
    verification_uri_complete: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    interval: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TokenPollResponse {
    Success {
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
    },
    Error(TokenErrorResponse),
}

/// Runs the full device authorization grant flow and returns a
/// [`TokenRecord`] on success.
pub async fn authorize_device(
    config: &ProviderConfig,
    http_client: &Arc<dyn HttpClient>,
    browser: &Arc<dyn Browser>,
    timeouts: DeviceTimeouts,
    cancellation: CancellationToken,
) -> Result<TokenRecord> {
    let device_endpoint = config.device_authorization_endpoint.as_ref().ok_or_else(|| {
        AuthError::Configuration("device_authorization_endpoint is not configured".to_string())
    })?;

    let mut session = request_device_session(config, device_endpoint, http_client, timeouts).await?;

    info!(
        verification_uri = %session.verification_uri,
        user_code = %session.user_code,
        "starting device authorization"
    );
    eprintln!("To authenticate, visit: {}", session.verification_uri);
    eprintln!("And enter the code: {}", session.user_code);

    if let Some(complete_uri) = &session.verification_uri_complete {
        if browser.open_url(complete_uri).await.is_err() {
            eprintln!("Or visit directly: {complete_uri}");
        }
    }

    poll_for_token(config, http_client, &mut session, timeouts, cancellation).await
}

async fn request_device_session(
    config: &ProviderConfig,
    device_endpoint: &str,
    http_client: &Arc<dyn HttpClient>,
    timeouts: DeviceTimeouts,
) -> Result<DeviceSession> {
    let mut form: Vec<(&str, &str)> = vec![("client_id", &config.client_id)];
    if let Some(scopes) = &config.scopes {
        form.push(("scope", scopes));
    }

    let request = HttpRequest::new(HttpMethod::Post, device_endpoint)
        .form(&form)?
        .timeout(timeouts.http_request);

    let response = http_client
        .execute(request)
        .await
        .map_err(|e| AuthError::ConnectionFailed(format!("device authorization request failed: {e}")))?;

    if !response.is_success() {
        if let Ok(err) = response.json::<TokenErrorResponse>() {
            return Err(map_oauth_error(&err.error, err.error_description.as_deref()));
        }
        return Err(AuthError::Http(format!(
            "device authorization endpoint returned HTTP {}",
            response.status
        )));
    }

    let body: DeviceAuthorizationResponse = response
        .json()
        .map_err(|_| AuthError::Json("malformed device authorization response".to_string()))?;

    let now = Utc::now();
    let expires_at = now.timestamp() + body.expires_in.unwrap_or(900);

    Ok(DeviceSession {
        device_code: body.device_code,
        user_code: body.user_code,
        verification_uri: body.verification_uri,
        verification_uri_complete: body.verification_uri_complete,
        expires_at,
        interval: body.interval.unwrap_or(DEFAULT_DEVICE_POLL_INTERVAL_SECS),
    })
}

async fn poll_for_token(
    config: &ProviderConfig,
    http_client: &Arc<dyn HttpClient>,
    session: &mut DeviceSession,
    timeouts: DeviceTimeouts,
    cancellation: CancellationToken,
) -> Result<TokenRecord> {
    let deadline = core_async::time::sleep(timeouts.total);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => {
                return Err(AuthError::Timeout("device flow exceeded its total timeout".to_string()));
            }
            _ = cancellation.cancelled() => {
                return Err(AuthError::Timeout("device flow cancelled".to_string()));
            }
            _ = core_async::time::sleep(session.interval_duration()) => {}
        }

        if session.is_expired(Utc::now()) {
            return Err(AuthError::DeviceCodeExpired);
        }

        match poll_once(config, http_client, session, timeouts, cancellation.clone()).await? {
            Some(token) => return Ok(token),
            None => continue,
        }
    }
}

/// Issues one poll request. Returns `Ok(None)` to keep polling
/// (`authorization_pending` / `slow_down`), `Ok(Some(token))` on success, or
/// `Err` for a fatal outcome.
async fn poll_once(
    config: &ProviderConfig,
    http_client: &Arc<dyn HttpClient>,
    session: &mut DeviceSession,
    timeouts: DeviceTimeouts,
    cancellation: CancellationToken,
) -> Result<Option<TokenRecord>> {
    let form = [
        ("grant_type", "urn:ietf:params:oauth:grant-type:device_code"),
        ("device_code", session.device_code.as_str()),
        ("client_id", config.client_id.as_str()),
    ];

    let request = HttpRequest::new(HttpMethod::Post, &config.token_endpoint)
        .form(&form)?
        .timeout(timeouts.http_request)
        .cancellation(cancellation);

    let response = http_client
        .execute(request)
        .await
        .map_err(|e| AuthError::ConnectionFailed(format!("device poll request failed: {e}")))?;

    let body: TokenPollResponse = response
        .json()
        .map_err(|_| AuthError::Json("malformed device poll response".to_string()))?;

    match body {
        TokenPollResponse::Error(err) => match err.error.as_str() {
            "authorization_pending" => Ok(None),
            "slow_down" => {
                session.interval += SLOW_DOWN_INCREMENT_SECS;
                Ok(None)
            }
            "access_denied" => Err(AuthError::AuthorizationDenied(err.error_description.unwrap_or(err.error))),
            "expired_token" => Err(AuthError::DeviceCodeExpired),
            other => Err(map_oauth_error(other, err.error_description.as_deref())),
        },
        TokenPollResponse::Success { access_token, token_type, refresh_token, scope, expires_in, id_token } => {
            let now = Utc::now();
            Ok(Some(TokenRecord {
                access_token,
                token_type: token_type.unwrap_or_else(|| "Bearer".to_string()),
                refresh_token,
                scope,
                expires_at: expires_in.map(|secs| TokenRecord::expires_at_from_expires_in(now, secs)),
                id_token,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_authorization_response_defaults_interval() {
        let json = r#"{"device_code":"D","user_code":"WDJB-MJHT","verification_uri":"https://as/dev"}"#;
        let parsed: DeviceAuthorizationResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.interval, None);
        assert_eq!(parsed.expires_in, None);
    }

    #[test]
    fn token_poll_response_distinguishes_success_and_error() {
        let success: TokenPollResponse =
            serde_json::from_str(r#"{"access_token":"A","token_type":"Bearer"}"#).unwrap();
        assert!(matches!(success, TokenPollResponse::Success { .. }));

        let pending: TokenPollResponse =
            serde_json::from_str(r#"{"error":"authorization_pending"}"#).unwrap();
        assert!(matches!(pending, TokenPollResponse::Error(_)));
    }
}
