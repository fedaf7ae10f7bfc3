use async_trait::async_trait;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A ClientWrapper is a wrapper around a specific remote completion service.
/// It provides a common interface to request completions from a model.
/// It does not enforce any concurrency policy; for that we use a
/// [`CompletionGateway`](crate::CompletionGateway) which owns the process-wide
/// slot pool and uses a ClientWrapper to reach the service.

/// Represents the possible roles for a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Role {
    /// Set by the developer to steer the model's responses.
    System,
    /// A message sent by a human user (or app user).
    User,
    /// Content generated by the model as a response to earlier messages.
    Assistant,
}

/// How many tokens were spent on prompt vs. completion.
#[derive(Clone, Debug)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub total_tokens: usize,
}

/// Represents a generic message to be sent to a completion endpoint.
#[derive(Clone)]
pub struct Message {
    /// The role associated with the message.
    pub role: Role,
    /// The actual content of the message.
    pub content: Arc<str>,
}

/// Request knobs forwarded with every completion call.
///
/// The defaults mirror the settings the collaboration layer was tuned with:
/// short, high-temperature completions.
#[derive(Clone, Debug)]
pub struct CompletionOptions {
    /// Model identifier injected into each request. When empty, the client's
    /// own configured model is used.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on completion tokens.
    pub max_tokens: usize,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.9,
            max_tokens: 150,
        }
    }
}

/// Failure of a completion request, split by whether retrying could help.
///
/// The crate itself never retries — the distinction is surfaced to callers so
/// a surrounding driver can decide.
///
/// # Examples
///
/// ```
/// use confab::CompletionError;
///
/// let err = CompletionError::Transient("rate limited".into());
/// assert_eq!(err.to_string(), "transient completion failure: rate limited");
/// ```
#[derive(Debug, Clone)]
pub enum CompletionError {
    /// Retryable service failure: timeouts, rate limits, 5xx responses,
    /// connection errors.
    Transient(String),
    /// Non-retryable failure: authentication, malformed requests or
    /// responses.
    Permanent(String),
}

impl fmt::Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionError::Transient(msg) => {
                write!(f, "transient completion failure: {}", msg)
            }
            CompletionError::Permanent(msg) => {
                write!(f, "permanent completion failure: {}", msg)
            }
        }
    }
}

impl Error for CompletionError {}

/// Trait defining the interface to interact with a remote completion service.
#[async_trait]
pub trait ClientWrapper: Send + Sync {
    /// Send a conversation to the model and get a single response message.
    /// - `messages`: the messages to send in the request.
    /// - `options`: model/temperature/token limits for this call.
    async fn send_message(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<Message, CompletionError>;

    /// Identifier of the model this client is configured for.
    fn model_name(&self) -> &str;

    /// Hook to retrieve usage from the *last* send_message() call.
    /// Default impl returns None so wrappers without accounting don't break.
    async fn get_last_usage(&self) -> Option<TokenUsage> {
        match self.usage_slot() {
            Some(slot) => slot.lock().await.clone(),
            None => None,
        }
    }

    /// ClientWrapper implementations supporting TokenUsage tracking should
    /// return their slot by overriding this method.
    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        None
    }
}
