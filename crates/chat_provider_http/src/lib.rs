//! HTTP-backed implementation of the `chat_provider` contract.
//!
//! Requests are POSTed as `{history, prompt}` JSON; answers are decoded with
//! [`chat_provider::decode_completion_body`], so non-2xx bodies carrying
//! `{error}` surface their message to the user.

pub mod client;
pub mod config;
pub mod error;
pub mod retry;
pub mod url;

use chat_provider::{
    decode_completion_body, CompletionError, CompletionProvider, CompletionRequest,
    CompletionResponse, ProviderInitError, ProviderProfile,
};

pub use client::{ChatHttpClient, RawResponse};
pub use config::HttpProviderConfig;
pub use error::HttpProviderError;
pub use url::normalize_chat_url;

/// Stable provider identifier used for explicit startup selection.
pub const HTTP_PROVIDER_ID: &str = "http";

/// `CompletionProvider` adapter that drives [`ChatHttpClient`] to completion.
#[derive(Debug)]
pub struct HttpProvider {
    client: ChatHttpClient,
}

impl HttpProvider {
    pub fn new(config: HttpProviderConfig) -> Result<Self, ProviderInitError> {
        Ok(Self {
            client: ChatHttpClient::new(config)?,
        })
    }

    pub fn endpoint(&self) -> &str {
        self.client.endpoint()
    }

    fn send_blocking(&self, request: &CompletionRequest) -> Result<RawResponse, HttpProviderError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(HttpProviderError::Runtime)?;

        runtime.block_on(self.client.send(request))
    }
}

impl CompletionProvider for HttpProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: HTTP_PROVIDER_ID.to_string(),
            model_id: self.client.config().model_id.clone(),
        }
    }

    fn complete(&self, req: &CompletionRequest) -> Result<CompletionResponse, CompletionError> {
        let raw = self.send_blocking(req).map_err(|error| {
            tracing::warn!(endpoint = %self.endpoint(), %error, "completion transport failed");
            CompletionError::from(error)
        })?;

        decode_completion_body(raw.status, &raw.body)
    }
}
