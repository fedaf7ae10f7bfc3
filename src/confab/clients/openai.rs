//! The `OpenAIClient` struct implements [`ClientWrapper`] for OpenAI-compatible
//! chat-completions endpoints, capturing both the assistant response and token
//! usage (input vs output) for cost tracking.
//!
//! Failures are classified per the gateway contract: rate limits, timeouts, and
//! server errors surface as [`CompletionError::Transient`]; authentication,
//! malformed requests, and undecodable bodies as [`CompletionError::Permanent`].
//!
//! # Example
//!
//! ```rust,no_run
//! use confab::clients::openai::{Model, OpenAIClient};
//! use confab::client_wrapper::{ClientWrapper, CompletionOptions, Message, Role};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let secret_key: String = std::env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY not set");
//!     let client = OpenAIClient::new_with_model_enum(&secret_key, Model::GPT35Turbo);
//!
//!     let resp = client
//!         .send_message(
//!             &[Message {
//!                 role: Role::System,
//!                 content: Arc::from("Say hello in one word."),
//!             }],
//!             &CompletionOptions::default(),
//!         )
//!         .await
//!         .unwrap();
//!     println!("Assistant: {}", resp.content);
//!
//!     if let Some(usage) = client.get_last_usage().await {
//!         println!(
//!             "Tokens — input: {}, output: {}, total: {}",
//!             usage.input_tokens, usage.output_tokens, usage.total_tokens
//!         );
//!     }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::confab::client_wrapper::{
    ClientWrapper, CompletionError, CompletionOptions, Message, Role, TokenUsage,
};
use crate::confab::clients::http_pool::get_http_client;

/// Model identifiers commonly used with the Chat Completions API.
pub enum Model {
    /// `gpt-3.5-turbo` – the tier the collaboration defaults were tuned on.
    GPT35Turbo,
    /// `gpt-4o` – Omni model with text + image inputs.
    GPT4o,
    /// `gpt-4o-mini` – cost effective GPT-4o derivative.
    GPT4oMini,
    /// `gpt-4.1` – general availability GPT-4.1.
    GPT41,
    /// `gpt-4.1-mini` – reduced cost GPT-4.1 tier.
    GPT41Mini,
    /// `gpt-4.1-nano` – ultra low cost GPT-4.1 derivative.
    GPT41Nano,
}

/// Convert a [`Model`] variant into the string identifier expected by the REST API.
pub fn model_to_string(model: Model) -> String {
    match model {
        Model::GPT35Turbo => "gpt-3.5-turbo".to_string(),
        Model::GPT4o => "gpt-4o".to_string(),
        Model::GPT4oMini => "gpt-4o-mini".to_string(),
        Model::GPT41 => "gpt-4.1".to_string(),
        Model::GPT41Mini => "gpt-4.1-mini".to_string(),
        Model::GPT41Nano => "gpt-4.1-nano".to_string(),
    }
}

/// Client wrapper for OpenAI-compatible Chat Completions endpoints.
///
/// The wrapper maintains the selected model identifier plus an internal
/// [`TokenUsage`] slot so callers can inspect how many tokens each request
/// consumed. It reuses the shared HTTP client configured in
/// [`crate::confab::clients::http_pool`].
pub struct OpenAIClient {
    /// Pooled HTTP client for the configured base URL.
    http: reqwest::Client,
    /// Bearer token injected into each request.
    api_key: String,
    /// Endpoint root, without the `/chat/completions` suffix.
    base_url: String,
    /// Model name used when the per-call options don't name one.
    model: String,
    /// Storage for the token usage returned by the most recent request.
    token_usage: Mutex<Option<TokenUsage>>,
}

impl OpenAIClient {
    /// Construct a new client using the provided API key and [`Model`] variant.
    pub fn new_with_model_enum(secret_key: &str, model: Model) -> Self {
        Self::new_with_model_string(secret_key, &model_to_string(model))
    }

    /// Construct a new client using the provided API key and explicit model name.
    ///
    /// This is the most general constructor and can be used for unofficial model
    /// identifiers (e.g. OpenAI compatible self-hosted deployments).
    pub fn new_with_model_string(secret_key: &str, model_name: &str) -> Self {
        Self::new_with_base_url(secret_key, model_name, "https://api.openai.com/v1")
    }

    /// Construct a client targeting a custom OpenAI compatible base URL.
    pub fn new_with_base_url(secret_key: &str, model_name: &str, base_url: &str) -> Self {
        OpenAIClient {
            http: get_http_client(base_url),
            api_key: secret_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model_name.to_string(),
            token_usage: Mutex::new(None),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: usize,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct WireUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}

fn role_to_str(role: &Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

/// Pull the service's own error description out of a failure body, if the
/// body is the usual `{"error": {"message": ...}}` JSON envelope.
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(ToString::to_string)
}

#[async_trait]
impl ClientWrapper for OpenAIClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn send_message(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<Message, CompletionError> {
        let wire_messages: Vec<WireMessage> = messages
            .iter()
            .map(|msg| WireMessage {
                role: role_to_str(&msg.role),
                content: &*msg.content,
            })
            .collect();

        let model = if options.model.is_empty() {
            self.model.as_str()
        } else {
            options.model.as_str()
        };

        let body = ChatRequest {
            model,
            messages: wire_messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                log::error!("OpenAIClient::send_message(...): transport error: {}", err);
                CompletionError::Transient(format!("request to {} failed: {}", url, err))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            let detail = extract_error_message(&body_text).unwrap_or(body_text);
            let message = format!("{} returned {}: {}", url, status, detail);
            log::error!("OpenAIClient::send_message(...): {}", message);
            return Err(
                if status.as_u16() == 408 || status.as_u16() == 429 || status.is_server_error() {
                    CompletionError::Transient(message)
                } else {
                    CompletionError::Permanent(message)
                },
            );
        }

        let parsed: ChatResponse = response.json().await.map_err(|err| {
            CompletionError::Permanent(format!("failed to decode completion body: {}", err))
        })?;

        if let Some(usage) = &parsed.usage {
            *self.token_usage.lock().await = Some(TokenUsage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            });
        }

        let content = parsed
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| {
                CompletionError::Permanent("completion response contained no choices".to_string())
            })?;

        Ok(Message {
            role: Role::Assistant,
            content: Arc::from(content.as_str()),
        })
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        Some(&self.token_usage)
    }
}

#[cfg(test)]
mod tests {
    use super::extract_error_message;

    #[test]
    fn test_extract_error_message_reads_envelope() {
        let body = r#"{"error": {"message": "Rate limit reached", "type": "requests"}}"#;
        assert_eq!(
            extract_error_message(body),
            Some("Rate limit reached".to_string())
        );
        assert_eq!(extract_error_message("not json"), None);
        assert_eq!(extract_error_message(r#"{"ok": true}"#), None);
    }
}
