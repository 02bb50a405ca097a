//! User-assigned managed identity over the instance metadata service
//!
//! Requests tokens from IMDS with the identity's `client_id` in the query and
//! caches them per resource until shortly before they expire.

use async_trait::async_trait;
use azure_core::auth::{AccessToken, TokenCredential};
use azure_core::error::{Error as AzureError, ErrorKind};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use tracing::debug;
use url::Url;

const IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const IMDS_API_VERSION: &str = "2019-08-01";

/// Tokens this close to expiry are fetched again
const EXPIRY_MARGIN: Duration = Duration::minutes(5);

#[derive(Debug, Deserialize)]
struct ImdsTokenResponse {
    access_token: String,
    expires_on: String,
}

#[derive(Debug)]
pub struct UserAssignedIdentityCredential {
    client_id: String,
    endpoint: String,
    http_client: Client,
    cache: Mutex<HashMap<String, AccessToken>>,
}

impl UserAssignedIdentityCredential {
    pub fn new<S: Into<String>>(client_id: S) -> Self {
        Self {
            client_id: client_id.into(),
            endpoint: IMDS_ENDPOINT.to_string(),
            http_client: Client::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Point the credential at another token endpoint
    pub fn with_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// IMDS token URL for `resource` on behalf of this identity
    pub fn token_url(&self, resource: &str) -> azure_core::Result<Url> {
        Url::parse_with_params(
            &self.endpoint,
            &[
                ("api-version", IMDS_API_VERSION),
                ("resource", resource),
                ("client_id", self.client_id.as_str()),
            ],
        )
        .map_err(|e| credential_error(format!("Invalid IMDS endpoint '{}': {e}", self.endpoint)))
    }

    async fn request_token(&self, resource: &str) -> azure_core::Result<AccessToken> {
        let url = self.token_url(resource)?;
        debug!("Requesting token for {} as {}", resource, self.client_id);

        let response = self
            .http_client
            .get(url)
            .header("Metadata", "true")
            .send()
            .await
            .map_err(|e| credential_error(format!("IMDS request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(credential_error(format!(
                "IMDS returned HTTP {} for client id {}",
                response.status(),
                self.client_id
            )));
        }

        let body: ImdsTokenResponse = response
            .json()
            .await
            .map_err(|e| credential_error(format!("Invalid IMDS token response: {e}")))?;

        let expires_on = body
            .expires_on
            .parse::<i64>()
            .ok()
            .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
            .ok_or_else(|| {
                credential_error(format!("Invalid token expiry '{}'", body.expires_on))
            })?;

        Ok(AccessToken::new(body.access_token, expires_on))
    }
}

/// `https://storage.azure.com/.default` becomes `https://storage.azure.com`
pub fn scope_to_resource(scope: &str) -> &str {
    scope.strip_suffix("/.default").unwrap_or(scope)
}

fn credential_error(message: String) -> AzureError {
    AzureError::message(ErrorKind::Credential, message)
}

#[async_trait]
impl TokenCredential for UserAssignedIdentityCredential {
    async fn get_token(&self, scopes: &[&str]) -> azure_core::Result<AccessToken> {
        let scope = scopes
            .first()
            .ok_or_else(|| credential_error("No scope requested".to_string()))?;
        let resource = scope_to_resource(scope);

        let mut cache = self.cache.lock().await;
        if let Some(token) = cache.get(resource) {
            if token.expires_on > OffsetDateTime::now_utc() + EXPIRY_MARGIN {
                return Ok(token.clone());
            }
        }

        let token = self.request_token(resource).await?;
        cache.insert(resource.to_string(), token.clone());
        Ok(token)
    }

    async fn clear_cache(&self) -> azure_core::Result<()> {
        self.cache.lock().await.clear();
        Ok(())
    }
}
