//! Deterministic in-process implementation of the `chat_provider` contract.
//!
//! Without a script it answers like a stubbed completion endpoint: the header
//! is derived from the prompt and the message echoes it. Scripted replies are
//! consumed in order before falling back to the stub.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use chat_provider::{
    CompletionError, CompletionProvider, CompletionRequest, CompletionResponse, ProviderProfile,
};

/// Stable provider identifier used for explicit startup selection.
pub const MOCK_PROVIDER_ID: &str = "mock";

/// Header used when the prompt yields no usable text.
pub const DEFAULT_HEADER: &str = "New rabbithole";

const STUB_PREAMBLE: &str =
    "This is a stubbed response. Configure a real completion provider to talk to a model.\n\n";
const EMPTY_PROMPT_TEXT: &str = "Ask me anything to start.";
const HEADER_CHAR_LIMIT: usize = 48;

/// One scripted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    Respond { header: String, message: String },
    Fail(CompletionError),
}

impl MockReply {
    #[must_use]
    pub fn respond(header: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Respond {
            header: header.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn fail(error: CompletionError) -> Self {
        Self::Fail(error)
    }
}

/// Deterministic mock provider used by `branch_chat` tests and local runs.
#[derive(Debug, Default)]
pub struct MockProvider {
    script: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<CompletionRequest>>,
    latency: Option<Duration>,
}

impl MockProvider {
    /// Creates a provider that always answers with the stub reply.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider that answers with `replies` in order, then the stub.
    #[must_use]
    pub fn with_script(replies: impl IntoIterator<Item = MockReply>) -> Self {
        Self {
            script: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Delays every answer by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Queues another scripted reply.
    pub fn push_reply(&self, reply: MockReply) {
        lock_unpoisoned(&self.script).push_back(reply);
    }

    /// Returns every request received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<CompletionRequest> {
        lock_unpoisoned(&self.requests).clone()
    }
}

impl CompletionProvider for MockProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: MOCK_PROVIDER_ID.to_string(),
            model_id: "mock".to_string(),
        }
    }

    fn complete(&self, req: &CompletionRequest) -> Result<CompletionResponse, CompletionError> {
        lock_unpoisoned(&self.requests).push(req.clone());

        if let Some(latency) = self.latency {
            thread::sleep(latency);
        }

        let scripted = lock_unpoisoned(&self.script).pop_front();
        match scripted {
            Some(MockReply::Respond { header, message }) => {
                Ok(CompletionResponse { header, message })
            }
            Some(MockReply::Fail(error)) => Err(error),
            None => Ok(stub_response(&req.prompt)),
        }
    }
}

/// Builds the stub answer for `prompt`.
#[must_use]
pub fn stub_response(prompt: &str) -> CompletionResponse {
    CompletionResponse {
        header: stub_header(prompt),
        message: format!(
            "{STUB_PREAMBLE}{}",
            if prompt.is_empty() {
                EMPTY_PROMPT_TEXT
            } else {
                prompt
            }
        ),
    }
}

/// First 48 characters of the trimmed prompt with whitespace runs collapsed.
#[must_use]
pub fn stub_header(prompt: &str) -> String {
    let clipped: String = prompt.trim().chars().take(HEADER_CHAR_LIMIT).collect();
    let collapsed = clipped.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        DEFAULT_HEADER.to_string()
    } else {
        collapsed
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
