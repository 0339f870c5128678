//! Environment configuration.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::debounce::DEFAULT_PERSIST_DEBOUNCE;

pub const STATE_PATH_VAR: &str = "RABBITHOLE_STATE_PATH";
pub const PERSIST_DEBOUNCE_VAR: &str = "RABBITHOLE_PERSIST_DEBOUNCE_MS";
pub const LOG_VAR: &str = "RABBITHOLE_LOG";
pub const PROVIDER_VAR: &str = "RABBITHOLE_PROVIDER";
pub const CHAT_URL_VAR: &str = "RABBITHOLE_CHAT_URL";
pub const DEBUG_VAR: &str = "RABBITHOLE_DEBUG";

#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub state_path: Option<PathBuf>,
    pub persist_debounce: Duration,
    pub log_filter: Option<String>,
    pub provider: Option<String>,
    pub chat_url: Option<String>,
    pub debug: bool,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            state_path: env_string_opt(STATE_PATH_VAR).map(PathBuf::from),
            persist_debounce: env_millis(PERSIST_DEBOUNCE_VAR).unwrap_or(DEFAULT_PERSIST_DEBOUNCE),
            log_filter: env_string_opt(LOG_VAR),
            provider: env_string_opt(PROVIDER_VAR),
            chat_url: env_string_opt(CHAT_URL_VAR),
            debug: env_flag(DEBUG_VAR),
        }
    }

    /// Configured state file, or `<cwd>/.rabbithole/state.json`.
    #[must_use]
    pub fn state_path_or_default(&self, cwd: &Path) -> PathBuf {
        self.state_path
            .clone()
            .unwrap_or_else(|| state_store::default_state_path(cwd))
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            state_path: None,
            persist_debounce: DEFAULT_PERSIST_DEBOUNCE,
            log_filter: None,
            provider: None,
            chat_url: None,
            debug: false,
        }
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

fn env_millis(key: &str) -> Option<Duration> {
    env_string_opt(key)
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
}
