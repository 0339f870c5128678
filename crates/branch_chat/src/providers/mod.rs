use std::sync::Arc;

use chat_provider::{CompletionProvider, ProviderInitError};
use chat_provider_http::{HttpProvider, HttpProviderConfig, HTTP_PROVIDER_ID};
use chat_provider_mock::{MockProvider, MOCK_PROVIDER_ID};
use rabbithole::config::{EnvConfig, CHAT_URL_VAR};

pub const DEFAULT_PROVIDER_ID: &str = MOCK_PROVIDER_ID;

/// Resolves the provider named by `RABBITHOLE_PROVIDER`, defaulting to the mock.
pub fn provider_from_env(config: &EnvConfig) -> Result<Arc<dyn CompletionProvider>, ProviderInitError> {
    let provider_id = config
        .provider
        .as_deref()
        .map(str::trim)
        .unwrap_or(DEFAULT_PROVIDER_ID);

    provider_for_id(provider_id, config)
}

pub fn provider_for_id(
    provider_id: &str,
    config: &EnvConfig,
) -> Result<Arc<dyn CompletionProvider>, ProviderInitError> {
    match provider_id {
        MOCK_PROVIDER_ID => Ok(Arc::new(MockProvider::default())),
        HTTP_PROVIDER_ID => {
            let endpoint = config.chat_url.as_deref().ok_or_else(|| {
                ProviderInitError::new(format!(
                    "{CHAT_URL_VAR} must be set when using the '{HTTP_PROVIDER_ID}' provider"
                ))
            })?;
            let provider = HttpProvider::new(HttpProviderConfig::new(endpoint))?;
            Ok(Arc::new(provider))
        }
        unknown => Err(ProviderInitError::new(format!(
            "Unsupported provider '{unknown}'. Available providers: {MOCK_PROVIDER_ID}, {HTTP_PROVIDER_ID}"
        ))),
    }
}
