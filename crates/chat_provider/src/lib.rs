//! Provider-neutral contract for requesting one chat completion.
//!
//! This crate defines the history/request/response shapes exchanged with a
//! completion provider and the JSON wire codec for them. It contains no
//! transport and no conversation-tree logic.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fallback error text when a failing response carries no `error` field.
pub const REQUEST_FAILED_MESSAGE: &str = "LLM request failed.";

/// Error text for a success status whose body is not `{header, message}`.
pub const MALFORMED_RESPONSE_MESSAGE: &str = "Malformed response from the model.";

/// Author of one history line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One model-facing line of linearized conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryLine {
    pub role: Role,
    pub text: String,
}

impl HistoryLine {
    #[must_use]
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Input for one completion: prior history plus the new user prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub history: Vec<HistoryLine>,
    pub prompt: String,
}

impl CompletionRequest {
    #[must_use]
    pub fn new(history: Vec<HistoryLine>, prompt: impl Into<String>) -> Self {
        Self {
            history,
            prompt: prompt.into(),
        }
    }

    /// Serializes the request into the JSON body sent over the wire.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Successful completion payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub header: String,
    pub message: String,
}

/// Failure while requesting a completion.
///
/// `Display` yields text suitable for showing to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    /// Non-2xx response; `message` is the body's `error` field or a generic fallback.
    Status { status: u16, message: String },
    /// 2xx response whose body is not a `{header, message}` object.
    Malformed,
    /// The request never produced a response.
    Transport(String),
    /// Provider-local failure unrelated to transport.
    Provider(String),
}

impl fmt::Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status { message, .. } => f.write_str(message),
            Self::Malformed => f.write_str(MALFORMED_RESPONSE_MESSAGE),
            Self::Transport(message) | Self::Provider(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for CompletionError {}

/// Error returned while constructing/configuring a provider before any request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInitError {
    message: String,
}

impl ProviderInitError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ProviderInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ProviderInitError {}

impl From<String> for ProviderInitError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ProviderInitError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Immutable metadata describing a completion provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub provider_id: String,
    pub model_id: String,
}

/// Provider interface for answering one completion request.
///
/// Calls block until the provider answers; callers that must stay responsive
/// run them on a worker thread.
pub trait CompletionProvider: Send + Sync + 'static {
    /// Returns provider/model identity metadata.
    fn profile(&self) -> ProviderProfile;

    /// Requests one completion for `req`.
    fn complete(&self, req: &CompletionRequest) -> Result<CompletionResponse, CompletionError>;
}

/// Decodes a completion endpoint response from its status code and raw body.
///
/// Unparseable bodies are tolerated on failing statuses (the generic failure
/// text is used instead) and reported as [`CompletionError::Malformed`] on
/// successful ones.
pub fn decode_completion_body(status: u16, body: &str) -> Result<CompletionResponse, CompletionError> {
    let parsed = if body.trim().is_empty() {
        None
    } else {
        serde_json::from_str::<Value>(body).ok()
    };

    if !(200..300).contains(&status) {
        let message = parsed
            .as_ref()
            .and_then(|value| value.get("error"))
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
            .unwrap_or(REQUEST_FAILED_MESSAGE)
            .to_string();
        return Err(CompletionError::Status { status, message });
    }

    let Some(value) = parsed else {
        return Err(CompletionError::Malformed);
    };

    match (
        value.get("header").and_then(Value::as_str),
        value.get("message").and_then(Value::as_str),
    ) {
        (Some(header), Some(message)) => Ok(CompletionResponse {
            header: header.to_string(),
            message: message.to_string(),
        }),
        _ => Err(CompletionError::Malformed),
    }
}

/// Encodes the `{error}` body a failing endpoint answers with.
#[must_use]
pub fn error_body(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct EchoProvider;

    impl CompletionProvider for EchoProvider {
        fn profile(&self) -> ProviderProfile {
            ProviderProfile {
                provider_id: "echo".to_string(),
                model_id: "echo-model".to_string(),
            }
        }

        fn complete(
            &self,
            req: &CompletionRequest,
        ) -> Result<CompletionResponse, CompletionError> {
            Ok(CompletionResponse {
                header: "Echo".to_string(),
                message: format!("{} lines + {}", req.history.len(), req.prompt),
            })
        }
    }

    #[test]
    fn request_serializes_to_wire_shape() {
        let request = CompletionRequest::new(
            vec![HistoryLine::user("Hello"), HistoryLine::assistant("Hi there")],
            "Tell me more",
        );

        let value: Value =
            serde_json::from_str(&request.to_json().expect("request should encode"))
                .expect("encoded request should be JSON");
        assert_eq!(
            value,
            json!({
                "history": [
                    { "role": "user", "text": "Hello" },
                    { "role": "assistant", "text": "Hi there" }
                ],
                "prompt": "Tell me more"
            })
        );
    }

    #[test]
    fn success_body_decodes_header_and_message() {
        let response = decode_completion_body(200, r#"{"header":"Greeting","message":"Hi"}"#)
            .expect("valid body should decode");
        assert_eq!(
            response,
            CompletionResponse {
                header: "Greeting".to_string(),
                message: "Hi".to_string(),
            }
        );
    }

    #[test]
    fn failing_status_prefers_error_field() {
        let error = decode_completion_body(502, &error_body("upstream timed out"))
            .expect_err("non-2xx must fail");
        assert_eq!(
            error,
            CompletionError::Status {
                status: 502,
                message: "upstream timed out".to_string(),
            }
        );
        assert_eq!(error.to_string(), "upstream timed out");
    }

    #[test]
    fn failing_status_without_error_field_uses_generic_text() {
        for body in ["", "not json", r#"{"error": 7}"#, r#"{"error": ""}"#] {
            let error = decode_completion_body(500, body).expect_err("non-2xx must fail");
            assert_eq!(error.to_string(), REQUEST_FAILED_MESSAGE, "body: {body:?}");
        }
    }

    #[test]
    fn success_status_with_wrong_shape_is_malformed() {
        for body in ["", "[]", r#"{"header":"x"}"#, r#"{"header":1,"message":"m"}"#] {
            let error = decode_completion_body(200, body).expect_err("bad shape must fail");
            assert_eq!(error, CompletionError::Malformed, "body: {body:?}");
        }
        assert_eq!(
            CompletionError::Malformed.to_string(),
            MALFORMED_RESPONSE_MESSAGE
        );
    }

    #[test]
    fn provider_trait_is_object_safe() {
        let provider: Box<dyn CompletionProvider> = Box::new(EchoProvider);
        let response = provider
            .complete(&CompletionRequest::new(vec![HistoryLine::user("a")], "b"))
            .expect("echo should answer");
        assert_eq!(response.message, "1 lines + b");
        assert_eq!(provider.profile().provider_id, "echo");
    }

    #[test]
    fn provider_init_error_preserves_message() {
        let error = ProviderInitError::from("missing endpoint");
        assert_eq!(error.message(), "missing endpoint");
        assert_eq!(error.to_string(), "missing endpoint");
    }
}
