//! # Confab
//!
//! Confab is a Rust toolkit for coordinating a roster of conversational agents, each backed
//! by a remote text-completion endpoint, as they collaborate pairwise on a shared task.
//!
//! The crate provides carefully layered abstractions for:
//!
//! * **Admission-controlled completions**: [`CompletionGateway`] multiplexes every outbound
//!   model call from every agent onto a single slot pool, bounding the number of requests
//!   simultaneously in flight process-wide.
//! * **Stateful agents**: [`Agent`] couples an identity and role description with an
//!   append-only private memory, a pairwise conversation transcript, and a randomized
//!   visiting order (path) over its peers.
//! * **Concurrent coordination**: [`Group`] drives every agent through its entire path at
//!   once — each agent's own sequence of collaborations is strictly serial, while different
//!   agents' sequences interleave freely on the runtime.
//! * **Task planning**: [`TaskPlanner`] expands a raw user prompt into a sharper task
//!   statement, extracts its key topics, and derives one expert role per topic, ready to
//!   seed a roster via [`Group::from_plan`].
//! * **Provider flexibility**: the [`ClientWrapper`] trait abstracts the completion
//!   endpoint; [`clients::openai::OpenAIClient`] speaks the OpenAI-compatible
//!   chat-completions wire format out of the box.
//!
//! ## Quickstart
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use confab::clients::openai::{Model, OpenAIClient};
//! use confab::{CompletionGateway, Group, TaskPlanner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     confab::init_logger();
//!
//!     let api_key = std::env::var("OPENAI_API_KEY")?;
//!     let client = Arc::new(OpenAIClient::new_with_model_enum(&api_key, Model::GPT35Turbo));
//!     let gateway = Arc::new(CompletionGateway::new(client));
//!
//!     // Derive a roster of expert roles from the raw prompt.
//!     let plan = TaskPlanner::new(Arc::clone(&gateway))
//!         .plan("Design a rate limiter for a public HTTP API")
//!         .await?;
//!
//!     // Build the group, assign each agent a random visiting order, and run.
//!     let group = Group::from_plan(&plan, gateway)?;
//!     group.generate_paths().await;
//!     group.conduct_collaborations().await?;
//!
//!     for conversation in group.conversation_reports().await {
//!         println!("{}", conversation);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Every remote call suspends at the gateway until one of its N slots (default 128) is
//! free, so a large roster never overwhelms the completion service no matter how many
//! collaboration sequences are active at once.

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// The helper is intentionally lightweight so that applications embedding Confab can opt-in
/// to simple `RUST_LOG` driven diagnostics without having to choose a specific logging backend
/// upfront.
///
/// ```rust
/// confab::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

// Import the top-level `confab` module.
pub mod confab;

// Re-exporting key items for easier external access.
pub use confab::agent::{Agent, PartnerProfile};
pub use confab::client_wrapper;
pub use confab::client_wrapper::{
    ClientWrapper, CompletionError, CompletionOptions, Message, Role, TokenUsage,
};
pub use confab::clients;
pub use confab::config::GatewayConfig;
pub use confab::gateway::CompletionGateway;
pub use confab::group::{CollaborationReport, Group, GroupError, SequenceFailure};
pub use confab::roles::{TaskPlan, TaskPlanner};
