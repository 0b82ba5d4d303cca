//! Fluent request construction and URL assembly.

use crate::client::ClientConfig;
use crate::constants;
use crate::error::Error;
use indexmap::IndexMap;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::Serialize;
use std::str::FromStr;
use std::time::Duration;

/// A fully-assembled request, ready for a transport.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Final URL with the encoded query string appended.
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<String>,
    /// Bound on a single attempt.
    pub timeout: Duration,
    /// Bound on the whole call, attempts and backoffs included.
    pub deadline: Option<Duration>,
}

impl Request {
    #[must_use]
    pub fn builder() -> RequestBuilder {
        RequestBuilder::new()
    }

    /// Attach a bearer token. Called by the executor after token
    /// acquisition succeeds.
    pub(crate) fn set_bearer(&mut self, token: &str) -> Result<(), Error> {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| Error::config("access token contains invalid header characters"))?;
        self.headers
            .insert(reqwest::header::AUTHORIZATION, value);
        Ok(())
    }
}

/// Builds a [`Request`] step by step. Errors (unknown method, missing
/// URL, body serialisation) are deferred and surface once at
/// [`RequestBuilder::build`] as [`Error::Config`].
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: String,
    url: Option<String>,
    headers: IndexMap<String, String>,
    query: IndexMap<String, String>,
    body: Option<String>,
    timeout: Option<Duration>,
    deadline: Option<Duration>,
    deferred_error: Option<String>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            method: "GET".to_string(),
            url: None,
            headers: IndexMap::new(),
            query: IndexMap::new(),
            body: None,
            timeout: None,
            deadline: None,
            deferred_error: None,
        }
    }

    /// HTTP method name; one of GET, POST, PUT, PATCH, DELETE, HEAD
    /// (case-insensitive).
    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add one query parameter. Names and values are percent-encoded
    /// during assembly; pass raw values.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Sets both the `x-ms-version` header and the `api-version` query
    /// parameter.
    #[must_use]
    pub fn version(self, version: impl Into<String>) -> Self {
        let version = version.into();
        self.header(constants::HEADER_MS_VERSION, version.clone())
            .query(constants::QUERY_API_VERSION, version)
    }

    /// JSON-serialise `body` as the request payload.
    #[must_use]
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        match serde_json::to_string(body) {
            Ok(serialised) => self.body = Some(serialised),
            Err(err) => {
                self.deferred_error = Some(format!("failed to serialise request body: {err}"));
            }
        }
        self
    }

    /// Use an already-serialised payload verbatim.
    #[must_use]
    pub fn body_text(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Bound the whole call. When the budget runs out, in-flight work
    /// is cancelled, remaining retries are skipped, and the executor
    /// surfaces `Cancelled`. Overrides `ClientConfig::overall_deadline`.
    #[must_use]
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Assemble the final request: validate method and URL, attach the
    /// default headers, generate the correlation id, and append the
    /// encoded query string.
    pub fn build(self, config: &ClientConfig) -> Result<Request, Error> {
        if let Some(message) = self.deferred_error {
            return Err(Error::Config(message));
        }
        let method = parse_method(&self.method)?;
        let base_url = self
            .url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Error::config("request URL is missing"))?;

        let mut headers = HeaderMap::new();
        insert_header(&mut headers, constants::HEADER_ACCEPT, constants::CONTENT_TYPE_JSON)?;
        insert_header(
            &mut headers,
            constants::HEADER_CONTENT_TYPE,
            constants::CONTENT_TYPE_JSON,
        )?;
        insert_header(&mut headers, constants::HEADER_USER_AGENT, &config.user_agent())?;
        insert_header(
            &mut headers,
            constants::HEADER_CLIENT_REQUEST_ID,
            &uuid::Uuid::new_v4().to_string(),
        )?;
        for (name, value) in &self.headers {
            insert_header(&mut headers, name, value)?;
        }

        Ok(Request {
            method,
            url: assemble_url(&base_url, &self.query),
            headers,
            body: self.body,
            timeout: self.timeout.unwrap_or(config.default_timeout),
            deadline: self.deadline.or(config.overall_deadline),
        })
    }
}

fn parse_method(name: &str) -> Result<Method, Error> {
    let upper = name.to_ascii_uppercase();
    match upper.as_str() {
        "GET" | "POST" | "PUT" | "PATCH" | "DELETE" | "HEAD" => {
            Method::from_str(&upper).map_err(|_| Error::config(format!("unknown method: {name}")))
        }
        _ => Err(Error::config(format!("unknown method: {name}"))),
    }
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), Error> {
    let name = HeaderName::from_str(name)
        .map_err(|_| Error::config(format!("invalid header name: {name}")))?;
    let value = HeaderValue::from_str(value)
        .map_err(|_| Error::config(format!("invalid value for header {name}")))?;
    headers.insert(name, value);
    Ok(())
}

/// Join query parameters onto `base_url`, percent-encoding names and
/// values. The separator is `?` unless the URL already has a query.
fn assemble_url(base_url: &str, query: &IndexMap<String, String>) -> String {
    if query.is_empty() {
        return base_url.to_string();
    }
    let joined = query
        .iter()
        .map(|(name, value)| {
            format!("{}={}", urlencoding::encode(name), urlencoding::encode(value))
        })
        .collect::<Vec<_>>()
        .join("&");
    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{base_url}{separator}{joined}")
}
