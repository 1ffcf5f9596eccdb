//! Dynamic client registration: a thin RFC 7591/7592 protocol
//! wrapper. Each non-create operation carries
//! `Authorization: Bearer <registration_access_token>`.

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest};
use serde::Serialize;

use crate::error::{AuthError, Result};
use crate::types::RegistrationResponse;

/// Metadata accepted by the core for a registration request.
#[derive(Debug, Clone, Default)]
pub struct ClientMetadata {
    pub redirect_uris: Vec<String>,
    pub client_name: Option<String>,
    pub grant_types: Vec<String>,
    pub response_types: Vec<String>,
    pub scope: Option<String>,
    pub token_endpoint_auth_method: Option<String>,
}

impl ClientMetadata {
    pub fn new(redirect_uris: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            redirect_uris: redirect_uris.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Splits a comma-separated list from an outer layer, trimming each
    /// element and dropping empties.
    pub fn split_comma_separated(input: &str) -> Vec<String> {
        input
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if self.redirect_uris.is_empty() {
            return Err(AuthError::InvalidParameter(
                "registration requires at least one redirect_uri".to_string(),
            ));
        }
        Ok(())
    }

    fn to_json(&self) -> Result<serde_json::Value> {
        #[derive(Serialize)]
        struct Wire<'a> {
            redirect_uris: &'a [String],
            #[serde(skip_serializing_if = "Option::is_none")]
            client_name: &'a Option<String>,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            grant_types: &'a [String],
            #[serde(skip_serializing_if = "Vec::is_empty")]
            response_types: &'a [String],
            #[serde(skip_serializing_if = "Option::is_none")]
            scope: &'a Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            token_endpoint_auth_method: &'a Option<String>,
        }
        serde_json::to_value(Wire {
            redirect_uris: &self.redirect_uris,
            client_name: &self.client_name,
            grant_types: &self.grant_types,
            response_types: &self.response_types,
            scope: &self.scope,
            token_endpoint_auth_method: &self.token_endpoint_auth_method,
        })
        .map_err(|e| AuthError::Json(format!("failed to serialize client metadata: {e}")))
    }
}

/// A thin CRUD wrapper around a provider's registration endpoint.
pub struct RegistrationClient {
    registration_endpoint: String,
    http_client: Arc<dyn HttpClient>,
    http_timeout: Duration,
}

impl RegistrationClient {
    pub fn new(registration_endpoint: impl Into<String>, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            registration_endpoint: registration_endpoint.into(),
            http_client,
            http_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// POSTs new client metadata and returns the issued registration.
    pub async fn register(&self, metadata: &ClientMetadata) -> Result<RegistrationResponse> {
        metadata.validate()?;
        let request = HttpRequest::new(HttpMethod::Post, &self.registration_endpoint)
            .json(&metadata.to_json()?)?
            .timeout(self.http_timeout);
        self.send(request).await
    }

    /// Reads the current registration using `registration_client_uri` and
    /// `registration_access_token` returned at creation time.
    pub async fn read(&self, registration_client_uri: &str, registration_access_token: &str) -> Result<RegistrationResponse> {
        let request = HttpRequest::new(HttpMethod::Get, registration_client_uri)
            .bearer_token(registration_access_token)
            .timeout(self.http_timeout);
        self.send(request).await
    }

    /// Updates the registration's metadata.
    pub async fn update(
        &self,
        registration_client_uri: &str,
        registration_access_token: &str,
        metadata: &ClientMetadata,
    ) -> Result<RegistrationResponse> {
        metadata.validate()?;
        let request = HttpRequest::new(HttpMethod::Put, registration_client_uri)
            .bearer_token(registration_access_token)
            .json(&metadata.to_json()?)?
            .timeout(self.http_timeout);
        self.send(request).await
    }

    /// Deletes the registration.
    pub async fn delete(&self, registration_client_uri: &str, registration_access_token: &str) -> Result<()> {
        let request = HttpRequest::new(HttpMethod::Delete, registration_client_uri)
            .bearer_token(registration_access_token)
            .timeout(self.http_timeout);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| AuthError::ConnectionFailed(format!("registration delete failed: {e}")))?;

        if !response.is_success() {
            return Err(AuthError::Server(format!(
                "registration endpoint returned HTTP {} on delete",
                response.status
            )));
        }
        Ok(())
    }

    async fn send(&self, request: HttpRequest) -> Result<RegistrationResponse> {
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| AuthError::ConnectionFailed(format!("registration request failed: {e}")))?;

        if !response.is_success() {
            return Err(AuthError::Server(format!(
                "registration endpoint returned HTTP {}",
                response.status
            )));
        }

        response
            .json()
            .map_err(|_| AuthError::Json("malformed registration response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_metadata_without_redirect_uris() {
        let metadata = ClientMetadata::default();
        assert!(matches!(metadata.validate(), Err(AuthError::InvalidParameter(_))));
    }

    #[test]
    fn splits_and_trims_comma_separated_input() {
        let parsed = ClientMetadata::split_comma_separated(" authorization_code , refresh_token,, ");
        assert_eq!(parsed, vec!["authorization_code".to_string(), "refresh_token".to_string()]);
    }

    #[test]
    fn serializes_only_present_fields() {
        let metadata = ClientMetadata::new(["http://127.0.0.1/cb"]);
        let json = metadata.to_json().unwrap();
        assert!(json.get("client_name").is_none());
        assert_eq!(json["redirect_uris"][0], "http://127.0.0.1/cb");
    }
}
