//! Admission-controlled access to the remote completion service.
//!
//! Every completion request issued by every agent in the process funnels
//! through a [`CompletionGateway`]. The gateway owns a slot pool of N permits
//! (default 128); a caller suspends, without occupying a worker thread,
//! until a slot is free, holds the slot for the duration of the remote call,
//! and releases it on success and failure alike.
//!
//! The gateway performs no retries and no backoff: the underlying client's
//! success value or [`CompletionError`] is propagated unchanged.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use confab::clients::openai::{Model, OpenAIClient};
//! use confab::{CompletionGateway, GatewayConfig};
//!
//! # async {
//! let client = Arc::new(OpenAIClient::new_with_model_enum("key", Model::GPT35Turbo));
//! let gateway = CompletionGateway::with_config(
//!     client,
//!     GatewayConfig { max_in_flight: 16, ..GatewayConfig::default() },
//! );
//!
//! let text = gateway.complete("Say hello in one word.").await?;
//! println!("{}", text);
//! # Ok::<(), confab::CompletionError>(())
//! # };
//! ```

use crate::confab::client_wrapper::{
    ClientWrapper, CompletionError, CompletionOptions, Message, Role, TokenUsage,
};
use crate::confab::config::GatewayConfig;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Wraps a [`ClientWrapper`] behind a process-wide admission gate.
///
/// The gateway is an explicitly constructed resource with a defined lifetime:
/// create it once at startup, share it via `Arc` with every agent, and drop
/// it with the roster. It holds no external resources, so no teardown is
/// needed.
pub struct CompletionGateway {
    /// The remote completion service.
    client: Arc<dyn ClientWrapper>,
    /// Slot pool bounding simultaneous outstanding remote calls.
    slots: Arc<Semaphore>,
    /// Request options forwarded on every call.
    options: CompletionOptions,
}

impl CompletionGateway {
    /// Create a gateway with the default [`GatewayConfig`] (128 slots).
    pub fn new(client: Arc<dyn ClientWrapper>) -> Self {
        Self::with_config(client, GatewayConfig::default())
    }

    /// Create a gateway with an explicit configuration.
    pub fn with_config(client: Arc<dyn ClientWrapper>, config: GatewayConfig) -> Self {
        CompletionGateway {
            client,
            slots: Arc::new(Semaphore::new(config.max_in_flight)),
            options: config.options,
        }
    }

    /// Request a completion for `prompt`, suspending until a slot is free.
    ///
    /// The prompt is sent as a single system message together with the
    /// gateway's [`CompletionOptions`]. The slot is held for exactly the
    /// duration of the remote call and released on every exit path.
    pub async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        // The pool is owned by the gateway and never closed, so acquisition
        // can only fail after the gateway itself is gone.
        let _permit = self
            .slots
            .acquire()
            .await
            .expect("completion slot pool is never closed");

        let messages = [Message {
            role: Role::System,
            content: Arc::from(prompt),
        }];

        let response = self.client.send_message(&messages, &self.options).await?;
        Ok(response.content.to_string())
    }

    /// Number of slots currently free. Mostly useful for diagnostics and
    /// tests asserting the admission-control invariant.
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// The options forwarded with every request.
    pub fn options(&self) -> &CompletionOptions {
        &self.options
    }

    /// Model identifier reported by the underlying client.
    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    /// Token usage recorded by the underlying client for its most recent
    /// call, when the client supports accounting.
    pub async fn last_usage(&self) -> Option<TokenUsage> {
        self.client.get_last_usage().await
    }
}
