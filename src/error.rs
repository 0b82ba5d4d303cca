//! Error taxonomy shared by the discovery engine and the HTTP runtime.
//!
//! The set of failure kinds is closed and small, so it is modeled as a
//! single enum rather than an open hierarchy. HTTP failures are
//! classified from the response status once, in [`Error::classify_response`],
//! and every classified error keeps the response headers and raw body
//! for diagnostics.

use reqwest::header::HeaderMap;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // External errors surfaced by generator-side internals.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Credential invalid, token endpoint failure, or HTTP 401/403.
    #[error("authentication failed: {message}")]
    AuthenticationFailed {
        message: String,
        /// Present when the failure came from an HTTP response.
        response: Option<ErrorResponse>,
    },

    /// HTTP 404.
    #[error("resource not found: {0}")]
    ResourceNotFound(ErrorResponse),

    /// Any other HTTP status >= 400.
    #[error("service error: {0}")]
    ServiceError(ErrorResponse),

    /// Connection failure, timeout, or TLS failure.
    #[error("network error ({kind}): {message}")]
    Network {
        kind: NetworkErrorKind,
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Caller-initiated cancellation.
    #[error("request cancelled")]
    Cancelled,

    /// The caller-supplied request cannot be built or its payload
    /// cannot be (de)serialised.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Sub-kind tag for [`Error::Network`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    Timeout,
    Io,
}

impl std::fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Io => write!(f, "io"),
        }
    }
}

/// Diagnostic payload attached to classified HTTP errors.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    pub status: u16,
    pub headers: HeaderMap,
    /// `error.code` from the response body, when the body carried one.
    pub error_code: Option<String>,
    /// Human-readable message: `error.message` from the body, or `HTTP <status>`.
    pub message: String,
    /// Raw response body, unparsed.
    pub body: String,
    /// Total attempts made before this error surfaced (1 when no retries ran).
    pub attempts: u32,
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (HTTP {}", self.message, self.status)?;
        if let Some(code) = &self.error_code {
            write!(f, ", code {code}")?;
        }
        if self.attempts > 1 {
            write!(f, ", after {} attempts", self.attempts)?;
        }
        write!(f, ")")
    }
}

/// Wire shape of a service error body: `{"error": {"code": ..., "message": ...}}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorBodyInner,
}

#[derive(Debug, Deserialize)]
struct ErrorBodyInner {
    code: Option<String>,
    message: Option<String>,
}

impl Error {
    /// Create an authentication failure unrelated to an HTTP response
    /// (bad credentials, token endpoint unreachable).
    pub fn authentication_failed(message: impl Into<String>) -> Self {
        Self::AuthenticationFailed {
            message: message.into(),
            response: None,
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Map a transport-level failure onto the network taxonomy.
    #[must_use]
    pub fn from_transport(source: reqwest::Error) -> Self {
        let kind = if source.is_timeout() {
            NetworkErrorKind::Timeout
        } else {
            NetworkErrorKind::Io
        };
        Self::Network {
            kind,
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Classify an HTTP response with status >= 400 into the taxonomy.
    ///
    /// When the body is JSON of shape `{"error": {"code", "message"}}`
    /// the code and message are lifted out; otherwise the message falls
    /// back to `HTTP <status>`.
    #[must_use]
    pub fn classify_response(status: u16, headers: HeaderMap, body: String, attempts: u32) -> Self {
        let (error_code, message) = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) => (
                parsed.error.code,
                parsed
                    .error
                    .message
                    .unwrap_or_else(|| format!("HTTP {status}")),
            ),
            Err(_) => (None, format!("HTTP {status}")),
        };
        let response = ErrorResponse {
            status,
            headers,
            error_code,
            message,
            body,
            attempts,
        };
        match status {
            401 | 403 => Self::AuthenticationFailed {
                message: response.message.clone(),
                response: Some(response),
            },
            404 => Self::ResourceNotFound(response),
            _ => Self::ServiceError(response),
        }
    }

    /// The HTTP status carried by this error, when it came from a response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthenticationFailed { response, .. } => response.as_ref().map(|r| r.status),
            Self::ResourceNotFound(r) | Self::ServiceError(r) => Some(r.status),
            _ => None,
        }
    }

    /// The `error.code` extracted from the response body, if any.
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::AuthenticationFailed { response, .. } => {
                response.as_ref().and_then(|r| r.error_code.as_deref())
            }
            Self::ResourceNotFound(r) | Self::ServiceError(r) => r.error_code.as_deref(),
            _ => None,
        }
    }
}
