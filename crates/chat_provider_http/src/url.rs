use url::Url;

use crate::error::HttpProviderError;

/// Path appended when the configured endpoint names only a host.
pub const DEFAULT_CHAT_PATH: &str = "/api/chat";

/// Normalize a configured endpoint into the completion URL.
///
/// Normalization rules:
/// 1) surrounding whitespace and trailing slashes are dropped
/// 2) only `http` and `https` schemes are accepted
/// 3) a bare origin gets [`DEFAULT_CHAT_PATH`] appended
pub fn normalize_chat_url(input: &str) -> Result<String, HttpProviderError> {
    let trimmed = input.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(HttpProviderError::invalid_url(input, "endpoint is empty"));
    }

    let parsed = Url::parse(trimmed)
        .map_err(|error| HttpProviderError::invalid_url(input, error.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(HttpProviderError::invalid_url(
            input,
            format!("unsupported scheme '{}'", parsed.scheme()),
        ));
    }

    if parsed.path().is_empty() || parsed.path() == "/" {
        return Ok(format!("{trimmed}{DEFAULT_CHAT_PATH}"));
    }

    Ok(trimmed.to_string())
}
