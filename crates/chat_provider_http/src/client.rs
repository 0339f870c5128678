use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;

use chat_provider::CompletionRequest;

use crate::config::HttpProviderConfig;
use crate::error::HttpProviderError;
use crate::retry::{is_retryable_status, retry_delay};
use crate::url::normalize_chat_url;

/// Status and body of one completion endpoint answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug)]
pub struct ChatHttpClient {
    http: Client,
    endpoint: String,
    headers: HeaderMap,
    config: HttpProviderConfig,
}

impl ChatHttpClient {
    pub fn new(config: HttpProviderConfig) -> Result<Self, HttpProviderError> {
        let endpoint = normalize_chat_url(&config.endpoint)?;
        let headers = build_headers(&config)?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(HttpProviderError::ClientBuild)?;

        Ok(Self {
            http,
            endpoint,
            headers,
            config,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn config(&self) -> &HttpProviderConfig {
        &self.config
    }

    /// Posts `request` and returns the final answer after retries.
    ///
    /// Non-2xx answers are returned as [`RawResponse`]s; only failures to get
    /// any answer at all are errors.
    pub async fn send(&self, request: &CompletionRequest) -> Result<RawResponse, HttpProviderError> {
        let body = request.to_json().map_err(HttpProviderError::Encode)?;
        let mut attempt = 0u32;

        loop {
            let outcome = self.send_once(body.clone()).await;
            let retryable = match &outcome {
                Ok(response) => is_retryable_status(response.status),
                Err(HttpProviderError::Request(_)) => true,
                Err(_) => false,
            };

            if !retryable || attempt >= self.config.max_retries {
                return outcome;
            }

            tracing::debug!(
                endpoint = %self.endpoint,
                attempt,
                "completion request will be retried"
            );
            tokio::time::sleep(retry_delay(self.config.retry_base_delay, attempt)).await;
            attempt += 1;
        }
    }

    async fn send_once(&self, body: String) -> Result<RawResponse, HttpProviderError> {
        let response = self
            .http
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .body(body)
            .send()
            .await
            .map_err(HttpProviderError::Request)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(HttpProviderError::Request)?;
        Ok(RawResponse { status, body })
    }
}

fn build_headers(config: &HttpProviderConfig) -> Result<HeaderMap, HttpProviderError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if let Some(token) = config
        .bearer_token
        .as_deref()
        .map(str::trim)
        .filter(|token| !token.is_empty())
    {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| HttpProviderError::InvalidHeader { name: "authorization" })?;
        headers.insert(AUTHORIZATION, value);
    }

    if let Some(user_agent) = config.user_agent.as_deref() {
        let value = HeaderValue::from_str(user_agent)
            .map_err(|_| HttpProviderError::InvalidHeader { name: "user-agent" })?;
        headers.insert(USER_AGENT, value);
    }

    Ok(headers)
}
