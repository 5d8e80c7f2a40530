//! Console logging for binaries embedding the crate.

use std::sync::OnceLock;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Installs a global `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter`. Later calls, and calls made after some other subscriber
/// was installed, do nothing.
pub fn init_logging(default_filter: &str) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_filter(filter),
        );

        if subscriber.try_init().is_err() {
            tracing::debug!("global tracing subscriber already initialized");
        }
    });
}
