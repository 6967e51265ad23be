//! OpenAI-compatible chat completions client.

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use wand_rs_config::ProviderConfig;
use wand_rs_protocol::{Completion, CompletionProvider, FinishReason, ProviderError};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    finish_reason: Option<String>,
    #[serde(default)]
    message: Option<AssistantMessage>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Sends each prompt as a single system message to `{base_url}/chat/completions`.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiProvider {
    pub fn new(base_url: &str, model: impl Into<String>, api_key: Option<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, model, api_key)
    }

    /// Resolve the API key from the configured environment variable.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| ProviderError::MissingApiKey(config.api_key_env.clone()))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| ProviderError::Transport(err.to_string()))?;
        Ok(Self::with_client(
            client,
            &config.base_url,
            config.model.clone(),
            Some(api_key),
        ))
    }

    fn with_client(
        client: reqwest::Client,
        base_url: &str,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.into(),
            api_key,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, system_prompt: &str) -> Result<Completion, ProviderError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "system",
                content: system_prompt,
            }],
        };
        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        debug!(
            "sending chat completion (endpoint={}, model={}, prompt_len={})",
            self.endpoint,
            self.model,
            system_prompt.len()
        );
        let response = request
            .send()
            .await
            .map_err(|err| ProviderError::Transport(err.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| ProviderError::Transport(err.to_string()))?;
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        parse_completion(&text)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

fn parse_completion(body: &str) -> Result<Completion, ProviderError> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|err| ProviderError::Malformed(format!("{err}; body: {body}")))?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Malformed("response has no choices".to_string()))?;
    let finish_reason = choice
        .finish_reason
        .map(FinishReason::from)
        .unwrap_or_else(|| FinishReason::Other("unknown".to_string()));
    let content = choice.message.and_then(|message| message.content);
    let text = match content {
        Some(text) => text,
        None if finish_reason.is_stop() => {
            return Err(ProviderError::Malformed(
                "stop without message content".to_string(),
            ));
        }
        None => String::new(),
    };
    Ok(Completion {
        finish_reason,
        text,
    })
}
