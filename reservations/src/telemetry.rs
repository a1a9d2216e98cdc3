//! Logging and metrics bootstrap.

use crate::config::{EngineConfig, LoggingConfig};
use hotel_ops_runtime::metrics::describe_metrics;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs logging and describes the engine's metrics to whatever recorder
/// the host application installed.
pub fn init(config: &EngineConfig) {
    init_tracing(&config.logging);
    describe_metrics();
}

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` wins over `config.level` when set. A second call (or a
/// subscriber installed by the host application) is left alone.
pub fn init_tracing(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
