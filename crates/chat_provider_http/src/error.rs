use chat_provider::{CompletionError, ProviderInitError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpProviderError {
    #[error("invalid completion endpoint '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid value for header '{name}'")]
    InvalidHeader { name: &'static str },

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("failed to initialize tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("failed to encode completion request: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("completion request failed: {0}")]
    Request(#[source] reqwest::Error),
}

impl HttpProviderError {
    #[must_use]
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

impl From<HttpProviderError> for ProviderInitError {
    fn from(error: HttpProviderError) -> Self {
        ProviderInitError::new(error.to_string())
    }
}

impl From<HttpProviderError> for CompletionError {
    fn from(error: HttpProviderError) -> Self {
        match &error {
            HttpProviderError::Request(source) if source.is_timeout() => {
                CompletionError::Transport("The model request timed out.".to_string())
            }
            _ => CompletionError::Transport(error.to_string()),
        }
    }
}
