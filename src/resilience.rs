//! Retry policy and backoff computation for the HTTP executor.

use crate::constants;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::{Duration, SystemTime};

/// Configuration for retry behavior. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Minimum 1.
    pub max_attempts: u32,
    /// Base delay for the exponential backoff.
    pub base_delay: Duration,
    /// Upper bound on any computed backoff delay.
    pub max_delay: Duration,
    /// HTTP status codes that trigger a retry.
    pub retryable_status_codes: HashSet<u16>,
    /// Retry when an attempt times out.
    pub retry_on_timeout: bool,
    /// Retry on connection-level failures.
    pub retry_on_network_error: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(1600),
            retryable_status_codes: [429, 502, 503, 504].into_iter().collect(),
            retry_on_timeout: true,
            retry_on_network_error: true,
        }
    }
}

impl RetryPolicy {
    /// A policy that disables retries entirely.
    #[must_use]
    pub fn no_retries() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_status_codes.contains(&status)
    }
}

/// Parses the `Retry-After` header and returns the server-requested delay.
///
/// Accepts either an all-digits seconds value or an RFC 1123 HTTP-date;
/// a date in the past yields a zero delay. Returns `None` when the
/// header is absent or unparseable.
#[must_use]
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(constants::HEADER_RETRY_AFTER)?.to_str().ok()?;
    parse_retry_after_value(value)
}

/// Core `Retry-After` value parsing, usable with any string source.
#[must_use]
pub fn parse_retry_after_value(value: &str) -> Option<Duration> {
    let value = value.trim();
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        return value.parse::<u64>().ok().map(Duration::from_secs);
    }
    if let Ok(date) = httpdate::parse_http_date(value) {
        // Past dates clamp to zero rather than being discarded.
        return Some(
            date.duration_since(SystemTime::now())
                .unwrap_or(Duration::ZERO),
        );
    }
    None
}

/// Computes the delay before the next attempt.
///
/// A server-supplied `Retry-After` value wins outright. Otherwise the
/// delay is `base_delay * 2^(attempt-1)` plus uniform jitter in
/// `[0, 0.5 * exponential]`, capped at `max_delay`. `attempt` is the
/// 1-indexed attempt that just failed.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
pub fn compute_backoff(
    policy: &RetryPolicy,
    attempt: u32,
    retry_after: Option<Duration>,
) -> Duration {
    if let Some(server_delay) = retry_after {
        return server_delay;
    }
    let exponent = attempt.saturating_sub(1).min(30);
    let exponential = policy.base_delay.as_millis() as u64 * (1u64 << exponent);
    let jitter = (fastrand::f64() * 0.5 * exponential as f64) as u64;
    let delay = exponential.saturating_add(jitter);
    Duration::from_millis(delay).min(policy.max_delay)
}
