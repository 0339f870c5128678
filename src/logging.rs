//! Process-wide `tracing` subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::EnvConfig;

/// Filter used when `RABBITHOLE_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Filter used when `RABBITHOLE_DEBUG=1` and no explicit filter is given.
pub const DEBUG_LOG_FILTER: &str = "rabbithole=debug,branch_chat=debug,warn";

/// Directive string the subscriber should be built from.
#[must_use]
pub fn filter_directives(config: &EnvConfig) -> &str {
    match (&config.log_filter, config.debug) {
        (Some(filter), _) => filter,
        (None, true) => DEBUG_LOG_FILTER,
        (None, false) => DEFAULT_LOG_FILTER,
    }
}

/// Installs a stderr `fmt` subscriber. Later calls leave the first one in place.
pub fn init(config: &EnvConfig) {
    let filter = EnvFilter::try_new(filter_directives(config))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
