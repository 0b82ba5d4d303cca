//! The retrying HTTP executor.
//!
//! Executors are cheap to clone (clones share the transport and token
//! provider) and safe to share across tasks; configuration is
//! immutable after construction. Within one `execute`
//! call, attempts are strictly sequential. Dropping the returned
//! future cancels the in-flight attempt and skips remaining retries;
//! an overall call deadline ([`RequestBuilder::deadline`] or
//! `ClientConfig::overall_deadline`) does the same from the inside and
//! surfaces [`Error::Cancelled`].

use crate::auth::TokenProvider;
use crate::client::request::RequestBuilder;
use crate::client::transport::{HttpTransport, RawResponse, ReqwestTransport};
use crate::client::{ClientConfig, HttpResponse};
use crate::error::{Error, NetworkErrorKind};
use crate::resilience::{compute_backoff, parse_retry_after, RetryPolicy};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout_at, Instant};

/// Composes requests, attaches bearer authentication, executes through
/// a transport, and applies the retry policy.
#[derive(Clone)]
pub struct HttpExecutor {
    transport: Arc<dyn HttpTransport>,
    token_provider: Option<Arc<dyn TokenProvider>>,
    config: ClientConfig,
    policy: RetryPolicy,
}

impl Default for HttpExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpExecutor {
    /// An unauthenticated executor with the default transport, config,
    /// and retry policy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            transport: Arc::new(ReqwestTransport::new()),
            token_provider: None,
            config: ClientConfig::default(),
            policy: RetryPolicy::default(),
        }
    }

    /// Attach bearer authentication from `provider`.
    #[must_use]
    pub fn with_token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    /// Swap the underlying transport. Tests use scripted transports.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = transport;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Execute `request` and decode the response body as JSON into `T`.
    ///
    /// # Errors
    ///
    /// Surfaces the classified error of the final attempt; transparent
    /// retries never leak their intermediate failures. A call that
    /// outlives its deadline surfaces [`Error::Cancelled`].
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<HttpResponse<T>, Error> {
        self.execute_with_policy(request, &self.policy).await
    }

    /// Execute with a retry policy applied for this call only.
    ///
    /// # Errors
    ///
    /// As [`HttpExecutor::execute`].
    pub async fn execute_with_policy<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        policy: &RetryPolicy,
    ) -> Result<HttpResponse<T>, Error> {
        let raw = self.send(request, policy).await?;
        let body: T = serde_json::from_str(&raw.body)
            .map_err(|err| Error::config(format!("failed to decode response body: {err}")))?;
        Ok(HttpResponse {
            status: raw.status,
            headers: raw.headers,
            body,
            raw_body: raw.body,
        })
    }

    /// Execute without decoding the body. For operations whose
    /// expected response carries no JSON payload.
    ///
    /// # Errors
    ///
    /// As [`HttpExecutor::execute`].
    pub async fn execute_raw(
        &self,
        request: RequestBuilder,
    ) -> Result<HttpResponse<()>, Error> {
        let raw = self.send(request, &self.policy).await?;
        Ok(HttpResponse {
            status: raw.status,
            headers: raw.headers,
            body: (),
            raw_body: raw.body,
        })
    }

    /// Build, authenticate, and run the attempt loop.
    async fn send(
        &self,
        request: RequestBuilder,
        policy: &RetryPolicy,
    ) -> Result<RawResponse, Error> {
        let mut request = request.build(&self.config)?;
        if let Some(provider) = &self.token_provider {
            // Token failure aborts before anything is sent.
            let token = provider.acquire().await?;
            request.set_bearer(&token)?;
        }
        let deadline = request.deadline.map(|budget| Instant::now() + budget);

        let mut attempt: u32 = 1;
        loop {
            let outcome = match deadline {
                Some(at) => match timeout_at(at, self.transport.send(&request)).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        tracing::debug!(attempt, "call deadline reached mid-attempt");
                        return Err(Error::Cancelled);
                    }
                },
                None => self.transport.send(&request).await,
            };
            let last_attempt = attempt >= policy.max_attempts;
            match outcome {
                Ok(raw) if raw.status < 400 => {
                    if attempt > 1 {
                        tracing::debug!(attempt, status = raw.status, "request recovered");
                    }
                    return Ok(raw);
                }
                Ok(raw) => {
                    if policy.is_retryable_status(raw.status) && !last_attempt {
                        let retry_after = parse_retry_after(&raw.headers);
                        let delay = compute_backoff(policy, attempt, retry_after);
                        tracing::debug!(
                            attempt,
                            status = raw.status,
                            delay_ms = delay.as_millis() as u64,
                            "retrying after retryable status"
                        );
                        backoff_within_deadline(delay, deadline).await?;
                    } else {
                        return Err(Error::classify_response(
                            raw.status,
                            raw.headers,
                            raw.body,
                            attempt,
                        ));
                    }
                }
                Err(err) => {
                    if retryable_network_error(&err, policy) && !last_attempt {
                        let delay = compute_backoff(policy, attempt, None);
                        tracing::debug!(
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "retrying after network error"
                        );
                        backoff_within_deadline(delay, deadline).await?;
                    } else {
                        return Err(err);
                    }
                }
            }
            attempt += 1;
        }
    }
}

/// Sleep through a backoff, unless the call deadline would pass first,
/// in which case remaining retries are skipped.
async fn backoff_within_deadline(
    delay: Duration,
    deadline: Option<Instant>,
) -> Result<(), Error> {
    if let Some(at) = deadline {
        if Instant::now() + delay >= at {
            tracing::debug!("call deadline reached, skipping remaining retries");
            return Err(Error::Cancelled);
        }
    }
    sleep(delay).await;
    Ok(())
}

fn retryable_network_error(error: &Error, policy: &RetryPolicy) -> bool {
    match error {
        Error::Network { kind, .. } => match kind {
            NetworkErrorKind::Timeout => policy.retry_on_timeout,
            NetworkErrorKind::Io => policy.retry_on_network_error,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_backoff_skipped_when_deadline_would_pass() {
        let deadline = Some(Instant::now() + Duration::from_millis(10));
        let err = backoff_within_deadline(Duration::from_secs(5), deadline)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }

    #[tokio::test]
    async fn test_backoff_runs_without_deadline() {
        backoff_within_deadline(Duration::from_millis(1), None)
            .await
            .unwrap();
    }

    #[test]
    fn test_network_error_retry_flags() {
        let policy = RetryPolicy {
            retry_on_timeout: true,
            retry_on_network_error: false,
            ..RetryPolicy::default()
        };
        let timeout = Error::Network {
            kind: NetworkErrorKind::Timeout,
            message: "deadline".to_string(),
            source: None,
        };
        let io = Error::Network {
            kind: NetworkErrorKind::Io,
            message: "refused".to_string(),
            source: None,
        };
        assert!(retryable_network_error(&timeout, &policy));
        assert!(!retryable_network_error(&io, &policy));
        assert!(!retryable_network_error(&Error::Cancelled, &policy));
    }
}
