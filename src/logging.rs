//! Tracing subscriber setup.
//!
//! Logs go to stderr so that stdout stays machine-readable for the CLI.

use crate::config::Settings;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Registry, fmt};

/// Filter directive for `settings`: `debug` when debug mode is on,
/// otherwise the configured `logging.filter`.
pub fn fallback_filter(settings: &Settings) -> String {
    if settings.debug {
        "debug".to_string()
    } else {
        settings.logging.filter.clone()
    }
}

/// Composes the env filter and a plain-text formatting layer writing to `sink`.
///
/// `RUST_LOG` takes precedence over `fallback` when set and valid.
pub fn subscriber<Sink>(fallback: String, sink: Sink) -> impl Subscriber + Send + Sync
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    Registry::default()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(sink))
}

/// Installs the global subscriber for `settings`.
///
/// Fails if a global subscriber is already set.
pub fn init(settings: &Settings) -> Result<(), TryInitError> {
    subscriber(fallback_filter(settings), std::io::stderr).try_init()
}
