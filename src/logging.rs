//! Tracing initialisation for binaries and tests embedding the SDK.
//!
//! The library itself only emits `tracing` events; installing a
//! subscriber is the embedder's call. This helper wires up the common
//! shape: an env-filter driven by `STRATUS_LOG`, text or JSON output
//! selected by `STRATUS_LOG_FORMAT`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install a global subscriber reading `STRATUS_LOG` (default `error`)
/// and `STRATUS_LOG_FORMAT` (`text` or `json`). Does nothing when a
/// subscriber is already installed, so tests can call it freely.
pub fn init_tracing() {
    let filter = std::env::var("STRATUS_LOG").unwrap_or_else(|_| "error".to_string());
    let env_filter = EnvFilter::try_new(&filter)
        .or_else(|_| EnvFilter::try_new("error"))
        .unwrap_or_else(|_| EnvFilter::new("error"));

    let json = std::env::var("STRATUS_LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr);
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(layer)
            .try_init();
    } else {
        let layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr);
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(layer)
            .try_init();
    }
}
