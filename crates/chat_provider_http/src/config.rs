use std::time::Duration;

/// Transport configuration for completion requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpProviderConfig {
    /// Completion endpoint; normalized with [`crate::normalize_chat_url`].
    pub endpoint: String,
    /// Optional bearer token passed as `Authorization`.
    pub bearer_token: Option<String>,
    /// Optional `User-Agent` override.
    pub user_agent: Option<String>,
    /// Optional whole-request timeout.
    pub timeout: Option<Duration>,
    /// Retries after the first attempt for retryable statuses and transport errors.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for every further attempt.
    pub retry_base_delay: Duration,
    /// Model label reported through the provider profile.
    pub model_id: String,
}

impl HttpProviderConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            bearer_token: None,
            user_agent: None,
            timeout: None,
            max_retries: 0,
            retry_base_delay: Duration::from_millis(500),
            model_id: "remote".to_string(),
        }
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_base_delay = base_delay;
        self
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }
}
