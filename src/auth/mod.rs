//! Access-token acquisition and caching for outbound requests.
//!
//! Providers implement [`TokenProvider`]; the executor depends only on
//! the trait. Refresh is single-flight: the cache mutex is held across
//! the network exchange, so concurrent callers wait for the one
//! in-flight refresh and then observe its result.

pub mod client_credentials;
pub mod imds;

pub use client_credentials::ClientCredentialsProvider;
pub use imds::ImdsProvider;

use crate::constants;
use crate::error::Error;
use async_trait::async_trait;
use serde::Deserialize;
use std::future::Future;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;

/// A bearer token with its absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub access_token: String,
    pub expires_at: SystemTime,
}

impl Token {
    /// Expired when now is within [`constants::TOKEN_EXPIRY_SKEW`] of
    /// the reported expiry.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .checked_sub(constants::TOKEN_EXPIRY_SKEW)
            .is_none_or(|deadline| SystemTime::now() >= deadline)
    }
}

/// A source of currently-valid access tokens.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns a valid token string, refreshing lazily when the cached
    /// token is absent or expired. Never returns an expired token.
    async fn acquire(&self) -> Result<String, Error>;

    /// True when the next [`TokenProvider::acquire`] would refresh.
    async fn is_expired(&self) -> bool;
}

/// Shared single-flight token slot used by every provider.
#[derive(Debug, Default)]
pub struct TokenCache {
    slot: Mutex<Option<Token>>,
}

impl TokenCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached token while valid; otherwise run `refresh`
    /// under the cache lock. A failed refresh leaves the previous
    /// cached token in place and surfaces the error.
    pub async fn acquire_with<F, Fut>(&self, refresh: F) -> Result<String, Error>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<Token, Error>> + Send,
    {
        let mut slot = self.slot.lock().await;
        if let Some(token) = slot.as_ref() {
            if !token.is_expired() {
                return Ok(token.access_token.clone());
            }
        }
        tracing::debug!("refreshing access token");
        let token = refresh().await?;
        let access_token = token.access_token.clone();
        *slot = Some(token);
        Ok(access_token)
    }

    pub async fn is_expired(&self) -> bool {
        self.slot
            .lock()
            .await
            .as_ref()
            .is_none_or(Token::is_expired)
    }

    /// A copy of the cached token, valid or not. Diagnostic use.
    pub async fn cached(&self) -> Option<Token> {
        self.slot.lock().await.clone()
    }
}

/// Wire shape shared by the token endpoints. IMDS reports `expires_in`
/// as a numeric string, the OAuth2 endpoint as a number.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(deserialize_with = "deserialize_expires_in")]
    pub expires_in: u64,
}

impl TokenResponse {
    pub(crate) fn into_token(self) -> Token {
        Token {
            access_token: self.access_token,
            expires_at: SystemTime::now() + Duration::from_secs(self.expires_in),
        }
    }
}

fn deserialize_expires_in<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct ExpiresIn;

    impl serde::de::Visitor<'_> for ExpiresIn {
        type Value = u64;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("seconds as a number or numeric string")
        }

        fn visit_u64<E: serde::de::Error>(self, value: u64) -> Result<u64, E> {
            Ok(value)
        }

        fn visit_i64<E: serde::de::Error>(self, value: i64) -> Result<u64, E> {
            u64::try_from(value).map_err(|_| E::custom("negative expires_in"))
        }

        fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<u64, E> {
            value.parse().map_err(E::custom)
        }
    }

    deserializer.deserialize_any(ExpiresIn)
}
