use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why the model stopped producing output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FinishReason {
    /// Natural end of the answer.
    Stop,
    /// Output hit the token limit.
    Length,
    /// Output was withheld by a content filter.
    ContentFilter,
    /// Model asked to call a tool instead of answering.
    ToolCalls,
    /// Any other provider-specific reason, including a missing one.
    Other(String),
}

impl FinishReason {
    pub fn parse(value: &str) -> Self {
        match value {
            "stop" => FinishReason::Stop,
            "length" => FinishReason::Length,
            "content_filter" => FinishReason::ContentFilter,
            "tool_calls" => FinishReason::ToolCalls,
            other => FinishReason::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FinishReason::Stop => "stop",
            FinishReason::Length => "length",
            FinishReason::ContentFilter => "content_filter",
            FinishReason::ToolCalls => "tool_calls",
            FinishReason::Other(other) => other,
        }
    }

    /// Only a normal stop counts as a usable answer.
    pub fn is_stop(&self) -> bool {
        matches!(self, FinishReason::Stop)
    }
}

impl From<String> for FinishReason {
    fn from(value: String) -> Self {
        FinishReason::parse(&value)
    }
}

impl From<FinishReason> for String {
    fn from(value: FinishReason) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single completion returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub finish_reason: FinishReason,
    pub text: String,
}

impl Completion {
    /// Completion that ended normally with the given text.
    pub fn stop(text: impl Into<String>) -> Self {
        Self {
            finish_reason: FinishReason::Stop,
            text: text.into(),
        }
    }
}

/// Errors returned by completion providers.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Request never produced a response (network, timeout, TLS).
    #[error("transport error: {0}")]
    Transport(String),
    /// Provider answered with a non-success status.
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    /// Response could not be decoded into a completion.
    #[error("malformed response: {0}")]
    Malformed(String),
    /// Provider-side failure reported without an HTTP status.
    #[error("provider error: {0}")]
    Provider(String),
    /// Credential environment variable is not set.
    #[error("missing API key: set {0}")]
    MissingApiKey(String),
}

/// The single capability the correction pipeline needs from a language model.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send `system_prompt` as a lone system message and await the answer.
    async fn complete(&self, system_prompt: &str) -> Result<Completion, ProviderError>;

    /// Short provider label used in logs.
    fn name(&self) -> &str {
        "provider"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn finish_reason_parses_known_and_other_values() {
        assert_eq!(FinishReason::parse("stop"), FinishReason::Stop);
        assert_eq!(
            FinishReason::parse("content_filter"),
            FinishReason::ContentFilter
        );
        assert_eq!(
            FinishReason::parse("eos"),
            FinishReason::Other("eos".to_string())
        );
        assert!(FinishReason::Stop.is_stop());
        assert!(!FinishReason::parse("Stop").is_stop());
    }

    #[test]
    fn finish_reason_serializes_as_plain_string() {
        let value = serde_json::to_value(FinishReason::Length).expect("serialize");
        assert_eq!(value, serde_json::json!("length"));
        let decoded: FinishReason =
            serde_json::from_value(serde_json::json!("custom")).expect("deserialize");
        assert_eq!(decoded, FinishReason::Other("custom".to_string()));
    }
}
