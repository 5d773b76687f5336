//! OpenAI-compatible chat completion client.
//!
//! One blocking-style call per turn: the full retained window goes out,
//! the text of the first choice comes back. No retries, no streaming. A
//! request timeout bounds how long a turn can hang on the endpoint.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dialogue::config::LlmConfig;
use crate::dialogue::errors::{DialogueError, DialogueResult};
use crate::dialogue::record::ChatMessage;

/// Boxed future type for completion calls.
pub type CompletionFuture<'a> = Pin<Box<dyn Future<Output = DialogueResult<String>> + Send + 'a>>;

/// A text-generation backend fed with an ordered message window.
pub trait CompletionBackend: Send + Sync {
    /// Generate an answer from the ordered message window.
    ///
    /// # Errors
    /// Returns an error if the transport or the endpoint fails.
    fn complete(&self, messages: &[ChatMessage]) -> CompletionFuture<'_>;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Chat completion client for OpenAI-compatible endpoints.
pub struct OpenAiChat {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl OpenAiChat {
    /// Build a client from the completion settings.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &LlmConfig) -> DialogueResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/v1/chat/completions",
                config.base_url.trim_end_matches('/')
            ),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

impl CompletionBackend for OpenAiChat {
    fn complete(&self, messages: &[ChatMessage]) -> CompletionFuture<'_> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
        };
        let body = serde_json::to_value(&request);

        Box::pin(async move {
            let body = body.map_err(|err| {
                DialogueError::InvalidRecord(format!("unserializable window: {err}"))
            })?;

            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(DialogueError::Completion {
                    status: status.as_u16(),
                    body,
                });
            }

            let parsed: CompletionResponse = response.json().await?;
            let choice = parsed
                .choices
                .into_iter()
                .next()
                .ok_or(DialogueError::MissingChoice)?;

            debug!(model = %self.model, chars = choice.message.content.len(), "completion received");
            Ok(choice.message.content)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::record::DialogueRole;

    #[test]
    fn test_request_body_shape() {
        let messages = vec![
            ChatMessage::new(DialogueRole::System, "be helpful"),
            ChatMessage::new(DialogueRole::User, "hi"),
        ];
        let request = CompletionRequest {
            model: "gpt-3.5-turbo",
            messages: &messages,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-3.5-turbo");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
    }

    #[test]
    fn test_response_parses_first_choice() {
        let raw = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "four"}},
                {"message": {"role": "assistant", "content": "ignored"}}
            ]
        }"#;
        let parsed: CompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "four");
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let config = LlmConfig {
            base_url: "https://api.openai.com/".to_string(),
            ..LlmConfig::default()
        };
        let client = OpenAiChat::new(&config).unwrap();
        assert_eq!(client.endpoint, "https://api.openai.com/v1/chat/completions");
    }
}
