//! The transport seam between the executor and the HTTP engine.
//!
//! Tests swap in scripted transports per executor instance; production
//! code uses [`ReqwestTransport`].

use crate::client::request::Request;
use crate::error::Error;
use async_trait::async_trait;
use reqwest::header::HeaderMap;

/// A response as received on the wire, before any decoding.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

/// One HTTP exchange. Implementations honor `request.timeout` and map
/// transport failures onto [`Error::Network`].
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &Request) -> Result<RawResponse, Error>;
}

/// Default transport backed by a shared `reqwest` client.
#[derive(Debug, Default, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (connection pool, proxy, TLS).
    #[must_use]
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &Request) -> Result<RawResponse, Error> {
        let mut outbound = self
            .http
            .request(request.method.clone(), &request.url)
            .headers(request.headers.clone())
            .timeout(request.timeout);
        if let Some(body) = &request.body {
            outbound = outbound.body(body.clone());
        }
        let response = outbound.send().await.map_err(Error::from_transport)?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(Error::from_transport)?;
        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}
