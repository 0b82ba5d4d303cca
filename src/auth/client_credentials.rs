//! OAuth2 client-credentials token source.

use crate::auth::{Token, TokenCache, TokenProvider, TokenResponse};
use crate::constants;
use crate::error::Error;
use async_trait::async_trait;

/// Acquires tokens through the OAuth2 client-credentials grant against
/// `https://login.microsoftonline.com/{tenant}/oauth2/v2.0/token`.
pub struct ClientCredentialsProvider {
    client_id: String,
    client_secret: String,
    tenant_id: String,
    scope: String,
    authority_host: String,
    http: reqwest::Client,
    cache: TokenCache,
}

impl ClientCredentialsProvider {
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        tenant_id: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            tenant_id: tenant_id.into(),
            scope: scope.into(),
            authority_host: constants::DEFAULT_AUTHORITY_HOST.to_string(),
            http: reqwest::Client::new(),
            cache: TokenCache::new(),
        }
    }

    /// Override the authority host. Tests point this at a local server.
    #[must_use]
    pub fn with_authority_host(mut self, host: impl Into<String>) -> Self {
        self.authority_host = host.into();
        self
    }

    /// Use a preconfigured HTTP client (timeouts, proxies).
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host, self.tenant_id
        )
    }

    async fn refresh(&self) -> Result<Token, Error> {
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", self.scope.as_str()),
        ];
        let response = self
            .http
            .post(self.token_url())
            .form(&params)
            .send()
            .await
            .map_err(|err| {
                Error::authentication_failed(format!("token endpoint unreachable: {err}"))
            })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "client-credentials token request rejected");
            return Err(Error::authentication_failed(format!(
                "token endpoint returned HTTP {}: {body}",
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
impl TokenProvider for ClientCredentialsProvider {
    async fn acquire(&self) -> Result<String, Error> {
        self.cache.acquire_with(|| self.refresh()).await
    }

    async fn is_expired(&self) -> bool {
        self.cache.is_expired().await
    }
}
