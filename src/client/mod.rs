//! Runtime HTTP pipeline: request building, transports, and the
//! retrying executor.

pub mod executor;
pub mod request;
pub mod transport;

pub use executor::HttpExecutor;
pub use request::{Request, RequestBuilder};
pub use transport::{HttpTransport, RawResponse, ReqwestTransport};

use crate::constants;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Executor-wide settings. Immutable after construction; per-request
/// concerns live on [`RequestBuilder`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Product name for the `User-Agent` header.
    pub product: String,
    /// Product version for the `User-Agent` header.
    pub product_version: String,
    /// Timeout applied to single attempts that do not set their own.
    pub default_timeout: Duration,
    /// Overall per-call budget across all attempts, including backoff
    /// sleeps. `None` leaves calls unbounded; requests may set their
    /// own with [`RequestBuilder::deadline`]. Exceeding it surfaces
    /// [`crate::error::Error::Cancelled`].
    #[serde(default)]
    pub overall_deadline: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            product: constants::DEFAULT_PRODUCT.to_string(),
            product_version: constants::DEFAULT_PRODUCT_VERSION.to_string(),
            default_timeout: constants::DEFAULT_REQUEST_TIMEOUT,
            overall_deadline: None,
        }
    }
}

impl ClientConfig {
    #[must_use]
    pub fn user_agent(&self) -> String {
        format!("{}/{}", self.product, self.product_version)
    }
}

/// A successful HTTP exchange with its decoded body.
#[derive(Debug, Clone)]
pub struct HttpResponse<T> {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: T,
    /// The body exactly as received, kept for diagnostics.
    pub raw_body: String,
}
