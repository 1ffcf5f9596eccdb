//! Token refresh (RFC 6749 §6).

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use chrono::Utc;
use serde::Deserialize;

use crate::error::{AuthError, Result};
use crate::pkce::{map_oauth_error, TokenErrorResponse};
use crate::types::{ProviderConfig, TokenRecord};

#[derive(Debug, Deserialize)]
struct RefreshSuccessResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    /// When the server omits this, the caller's previous refresh token is
    /// retained — the substitution happens here, before returning.
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    id_token: Option<String>,
}

/// Exchanges `refresh_token` for a new [`TokenRecord`]. If the server's
/// response omits a new `refresh_token`, the returned record retains the one
/// supplied here.
pub async fn refresh(
    config: &ProviderConfig,
    http_client: &Arc<dyn HttpClient>,
    refresh_token: &str,
    http_timeout: Duration,
) -> Result<TokenRecord> {
    if refresh_token.is_empty() {
        return Err(AuthError::NoRefreshToken);
    }

    let mut form: Vec<(&str, &str)> = vec![
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
    ];
    if config.client_secret.is_none() {
        form.push(("client_id", &config.client_id));
    }
    if let Some(scope) = &config.scopes {
        form.push(("scope", scope));
    }

    let mut request = HttpRequest::new(HttpMethod::Post, &config.token_endpoint)
        .form(&form)?
        .timeout(http_timeout);

    if let Some(secret) = &config.client_secret {
        request = request.basic_auth(&config.client_id, secret);
    }

    let response = http_client
        .execute(request)
        .await
        .map_err(|e| AuthError::ConnectionFailed(format!("refresh request failed: {e}")))?;

    if !response.is_success() {
        if let Ok(err) = response.json::<TokenErrorResponse>() {
            return Err(map_oauth_error(&err.error, err.error_description.as_deref()));
        }
        return Err(AuthError::Http(format!(
            "token endpoint returned HTTP {} during refresh",
            response.status
        )));
    }

    let body: RefreshSuccessResponse = response
        .json()
        .map_err(|_| AuthError::Json("malformed refresh response".to_string()))?;

    let now = Utc::now();
    Ok(TokenRecord {
        access_token: body.access_token,
        token_type: body.token_type.unwrap_or_else(|| "Bearer".to_string()),
        refresh_token: body.refresh_token.or_else(|| Some(refresh_token.to_string())),
        scope: body.scope,
        expires_at: body.expires_in.map(|secs| TokenRecord::expires_at_from_expires_in(now, secs)),
        id_token: body.id_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::http::{HttpResponse, RetryPolicy};
    use bytes::Bytes;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct StubHttpClient {
        response_body: String,
        status: u16,
        seen_requests: Mutex<Vec<HttpRequest>>,
    }

    #[async_trait]
    impl HttpClient for StubHttpClient {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
            self.seen_requests.lock().unwrap().push(request);
            Ok(HttpResponse {
                status: self.status,
                headers: HashMap::new(),
                body: Bytes::from(self.response_body.clone()),
            })
        }

        async fn execute_with_retry(&self, request: HttpRequest, _policy: RetryPolicy) -> BridgeResult<HttpResponse> {
            self.execute(request).await
        }
    }

    #[core_async::test]
    async fn refresh_without_empty_token_is_rejected() {
        let config = ProviderConfig::new("cid", "https://as/auth", "https://as/tok");
        let client: Arc<dyn HttpClient> = Arc::new(StubHttpClient {
            response_body: String::new(),
            status: 200,
            seen_requests: Mutex::new(Vec::new()),
        });
        let result = refresh(&config, &client, "", Duration::from_secs(5)).await;
        assert!(matches!(result, Err(AuthError::NoRefreshToken)));
    }

    #[core_async::test]
    async fn refresh_preserves_old_refresh_token_when_server_omits_it() {
        let config = ProviderConfig::new("cid", "https://as/auth", "https://as/tok");
        let client: Arc<dyn HttpClient> = Arc::new(StubHttpClient {
            response_body: r#"{"access_token":"A2","token_type":"Bearer","expires_in":3600}"#.to_string(),
            status: 200,
            seen_requests: Mutex::new(Vec::new()),
        });

        let token = refresh(&config, &client, "R1", Duration::from_secs(5)).await.unwrap();
        assert_eq!(token.access_token, "A2");
        assert_eq!(token.refresh_token.as_deref(), Some("R1"));
    }

    #[core_async::test]
    async fn refresh_uses_new_refresh_token_when_server_provides_one() {
        let config = ProviderConfig::new("cid", "https://as/auth", "https://as/tok");
        let client: Arc<dyn HttpClient> = Arc::new(StubHttpClient {
            response_body: r#"{"access_token":"A2","token_type":"Bearer","refresh_token":"R2"}"#.to_string(),
            status: 200,
            seen_requests: Mutex::new(Vec::new()),
        });

        let token = refresh(&config, &client, "R1", Duration::from_secs(5)).await.unwrap();
        assert_eq!(token.refresh_token.as_deref(), Some("R2"));
    }
}
