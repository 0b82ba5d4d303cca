//! Instance-metadata token source for workloads running inside the
//! cloud provider's network.

use crate::auth::{Token, TokenCache, TokenProvider, TokenResponse};
use crate::constants;
use crate::error::Error;
use async_trait::async_trait;

/// Acquires tokens from the instance-metadata endpoint
/// (`http://169.254.169.254`), which requires the `Metadata: true`
/// header and no credentials.
pub struct ImdsProvider {
    resource: String,
    client_id: Option<String>,
    endpoint: String,
    http: reqwest::Client,
    cache: TokenCache,
}

impl ImdsProvider {
    #[must_use]
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            client_id: None,
            endpoint: constants::DEFAULT_IMDS_ENDPOINT.to_string(),
            http: reqwest::Client::new(),
            cache: TokenCache::new(),
        }
    }

    /// Select a specific user-assigned identity.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Override the metadata endpoint. Tests point this at a local server.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    async fn refresh(&self) -> Result<Token, Error> {
        let url = format!("{}{}", self.endpoint, constants::IMDS_TOKEN_PATH);
        let mut query: Vec<(&str, &str)> = vec![
            (constants::QUERY_API_VERSION, constants::IMDS_API_VERSION),
            ("resource", self.resource.as_str()),
        ];
        if let Some(client_id) = &self.client_id {
            query.push(("client_id", client_id.as_str()));
        }
        let response = self
            .http
            .get(url)
            .query(&query)
            .header(constants::HEADER_METADATA, "true")
            .send()
            .await
            .map_err(|err| {
                Error::authentication_failed(format!("metadata endpoint unreachable: {err}"))
            })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "instance-metadata token request rejected");
            return Err(Error::authentication_failed(format!(
                "metadata endpoint returned HTTP {}: {body}",
                status.as_u16()
            )));
        }
        let parsed: TokenResponse = response.json().await.map_err(|err| {
            Error::authentication_failed(format!("malformed token response: {err}"))
        })?;
        Ok(parsed.into_token())
    }
}

#[async_trait]
impl TokenProvider for ImdsProvider {
    async fn acquire(&self) -> Result<String, Error> {
        self.cache.acquire_with(|| self.refresh()).await
    }

    async fn is_expired(&self) -> bool {
        self.cache.is_expired().await
    }
}
