//! Logging initialization
//!
//! `RUST_LOG` takes precedence over a configured filter; without either the
//! level is `info`. Every initializer is safe to call more than once: only
//! the first call installs a subscriber.

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

fn build_filter(filter: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter.unwrap_or(DEFAULT_FILTER)))
}

/// Human-readable output. Colors are disabled when `NO_COLOR` is set.
pub fn init_logging(filter: Option<&str>) {
    let ansi = std::env::var_os("NO_COLOR").is_none();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(filter))
        .with_target(true)
        .with_ansi(ansi)
        .try_init();
}

/// One JSON object per event, for log aggregation
#[cfg(feature = "json-logging")]
pub fn init_json_logging(filter: Option<&str>) {
    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(build_filter(filter))
        .with_current_span(false)
        .try_init();
}

/// Initialize from the `[logging]` config section
pub fn init_logging_from_config(config: Option<&LoggingConfig>) {
    let Some(config) = config else {
        init_logging(None);
        return;
    };

    if config.json_format {
        #[cfg(feature = "json-logging")]
        {
            init_json_logging(config.filter.as_deref());
            return;
        }
        #[cfg(not(feature = "json-logging"))]
        {
            init_logging(config.filter.as_deref());
            tracing::warn!("JSON logging requested but the json-logging feature is not enabled");
            return;
        }
    }
    init_logging(config.filter.as_deref());
}
