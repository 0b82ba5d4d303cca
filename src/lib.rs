//! OpenAPI discovery engine and authenticated HTTP runtime for cloud
//! management APIs.
//!
//! Two independent halves share one error taxonomy:
//!
//! - **Generator side** — [`discovery`] locates the specification file
//!   defining a named operation inside a versioned tree; [`spec`]
//!   resolves `$ref`s across files and extracts canonical
//!   [`spec::OperationRecord`]s for downstream code generation.
//! - **Runtime side** — [`auth`] provides cached, single-flight access
//!   tokens; [`client`] builds requests fluently and executes them with
//!   exponential-backoff retries, `Retry-After` honoring, and typed
//!   error classification.
//!
//! ```no_run
//! use stratus_sdk::client::{HttpExecutor, Request};
//! use stratus_sdk::auth::ClientCredentialsProvider;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), stratus_sdk::Error> {
//! let provider = ClientCredentialsProvider::new(
//!     "client-id", "client-secret", "tenant-id",
//!     "https://management.azure.com/.default",
//! );
//! let executor = HttpExecutor::new().with_token_provider(Arc::new(provider));
//! let request = Request::builder()
//!     .url("https://management.azure.com/subscriptions")
//!     .version("2024-07-01");
//! let subscriptions: stratus_sdk::client::HttpResponse<serde_json::Value> =
//!     executor.execute(request).await?;
//! # let _ = subscriptions;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod constants;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod resilience;
pub mod spec;

pub use error::Error;
pub use resilience::RetryPolicy;
