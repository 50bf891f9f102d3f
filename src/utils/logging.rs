//! Structured logging setup
//!
//! Installs a `tracing-subscriber` fmt subscriber configured from [`LoggingConfig`].
//! `RUST_LOG` takes precedence over the configured level when set.

use crate::config::LoggingConfig;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber.
///
/// Returns `false` if a subscriber was already installed; the existing one is kept.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(config.log_level.into()));
    let builder = fmt().with_env_filter(filter).with_target(true);

    let installed = if config.json_format {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    if installed {
        debug!(app = %config.app_name, level = %config.log_level, "logging initialised");
    }
    installed
}
