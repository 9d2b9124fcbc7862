use std::sync::Arc;

use error_stack::{Report, ResultExt};
use futures::future::BoxFuture;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::assistant::{Assistant, SYSTEM_PROMPT};
use crate::error::AssistantError;
use crate::model::ChatMessage;

const ASSISTANT_NAME: &str = "groq";

/// Groq's OpenAI-compatible chat completions endpoint.
pub struct GroqAssistant {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl GroqAssistant {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
        temperature: f64,
    ) -> Self {
        // Free tier: 30 requests per minute
        let quota = Quota::per_minute(nonzero!(30u32));
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens,
            temperature,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    fn build_request<'a>(&'a self, messages: &[ChatMessage]) -> CompletionRequest<'a> {
        let mut full = Vec::with_capacity(messages.len() + 1);
        full.push(ChatMessage::system(SYSTEM_PROMPT));
        full.extend_from_slice(messages);
        CompletionRequest {
            model: &self.model,
            messages: full,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: false,
        }
    }
}

impl Assistant for GroqAssistant {
    fn name(&self) -> &str {
        ASSISTANT_NAME
    }

    fn ask(&self, messages: &[ChatMessage]) -> BoxFuture<'_, Result<String, Report<AssistantError>>> {
        let request = self.build_request(messages);
        Box::pin(async move {
            self.rate_limiter.until_ready().await;

            let url = format!("{}/chat/completions", self.base_url);
            debug!(model = %self.model, messages = request.messages.len(), "sending chat completion");

            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
                .await
                .change_context(AssistantError::Request {
                    assistant: ASSISTANT_NAME.into(),
                })?;

            if !response.status().is_success() {
                return Err(Report::new(AssistantError::Request {
                    assistant: ASSISTANT_NAME.into(),
                })
                .attach(format!("HTTP status: {}", response.status())));
            }

            let body: CompletionResponse =
                response
                    .json()
                    .await
                    .change_context(AssistantError::ResponseParse {
                        assistant: ASSISTANT_NAME.into(),
                    })?;

            let reply = body.into_reply()?;
            info!(model = %self.model, chars = reply.len(), "chat completion received");
            Ok(reply)
        })
    }
}

// ── Request / response types ──────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f64,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

impl CompletionResponse {
    fn into_reply(self) -> Result<String, Report<AssistantError>> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                Report::new(AssistantError::InvalidResponse {
                    assistant: ASSISTANT_NAME.into(),
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assistant() -> GroqAssistant {
        GroqAssistant::new(
            "https://api.groq.com/openai/v1/",
            "key",
            "llama-3.3-70b-versatile",
            1000,
            0.7,
        )
    }

    #[test]
    fn request_prepends_system_prompt() {
        let assistant = assistant();
        let request = assistant.build_request(&[ChatMessage::user("How is AAPL doing?")]);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "llama-3.3-70b-versatile");
        assert_eq!(json["max_tokens"], 1000);
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], SYSTEM_PROMPT);
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "How is AAPL doing?");
    }

    #[test]
    fn reply_taken_from_first_choice() {
        let json = r#"{
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "Trending up."}, "finish_reason": "stop"},
                {"index": 1, "message": {"role": "assistant", "content": "ignored"}, "finish_reason": "stop"}
            ]
        }"#;
        let body: CompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.into_reply().unwrap(), "Trending up.");
    }

    #[test]
    fn empty_choices_is_invalid_response() {
        let body: CompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        let err = body.into_reply().unwrap_err();
        assert!(matches!(
            err.current_context(),
            AssistantError::InvalidResponse { .. }
        ));
    }

    #[test]
    fn null_content_is_invalid_response() {
        let body: CompletionResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#)
                .unwrap();
        assert!(body.into_reply().is_err());
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        assert_eq!(assistant().base_url, "https://api.groq.com/openai/v1");
    }

    /// Integration test: requires network access and `GROQ_API_KEY`.
    /// Run with `cargo test -- --ignored`
    #[tokio::test]
    #[ignore]
    async fn integration_ask() {
        let key = std::env::var("GROQ_API_KEY").expect("GROQ_API_KEY not set");
        let assistant = GroqAssistant::new(
            "https://api.groq.com/openai/v1",
            key,
            "llama-3.3-70b-versatile",
            64,
            0.0,
        );
        let reply = assistant
            .ask(&[ChatMessage::user("Reply with the single word: ok")])
            .await
            .unwrap();
        assert!(!reply.is_empty());
    }
}
