//! Agent state machine
//!
//! This module provides the core [`Agent`] struct: a named participant with a
//! role description, a private append-only memory, a pairwise conversation
//! transcript, and a randomized visiting order (path) over its peers.
//!
//! # State model
//!
//! All of an agent's mutable state (memory, transcript, and the
//! current-partner scratch field) lives behind a single per-agent
//! `tokio::sync::RwLock`. An agent is concurrently visible from two call
//! sites: its own collaboration sequence, and any peer that addresses it as a
//! partner mid-exchange. The lock makes each individual read or append atomic
//! across both. No guard is ever held across an await that can take another
//! agent's lock, so initiator/partner cross-access cannot deadlock.
//!
//! # Collaboration step
//!
//! One call to [`Agent::collaborate_with`] performs one self-then-partner
//! exchange: the agent's own contribution is generated first, the partner's
//! reply is requested second, both entries land in the *initiator's*
//! transcript, and the step closes with a memory update. The partner's own
//! transcript is not written; the partner answers purely from its internal
//! state (see [`Agent::reply`]).
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use confab::clients::openai::{Model, OpenAIClient};
//! use confab::{Agent, CompletionGateway};
//!
//! # async {
//! let client = Arc::new(OpenAIClient::new_with_model_enum("key", Model::GPT35Turbo));
//! let gateway = Arc::new(CompletionGateway::new(client));
//!
//! let alice = Agent::new(
//!     "Alice",
//!     "You are an expert in distributed systems.",
//!     "Design a rate limiter.",
//!     Arc::clone(&gateway),
//! );
//! let bob = Agent::new(
//!     "Bob",
//!     "You are an expert in API ergonomics.",
//!     "Design a rate limiter.",
//!     gateway,
//! );
//!
//! alice.collaborate_with(&bob).await?;
//! assert_eq!(alice.transcript().await.len(), 2);
//! # Ok::<(), confab::CompletionError>(())
//! # };
//! ```

use crate::confab::client_wrapper::CompletionError;
use crate::confab::gateway::CompletionGateway;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Instruction sent for the agent's own half of an exchange.
const CONTRIBUTE_INSTRUCTION: &str = "Add your contribution to the task at hand.";

/// Instruction sent when the agent answers as somebody else's partner.
const REPLY_INSTRUCTION: &str = "Please add your reply to the conversation. Only provide your \
     response. Stay on Task. Respond using your specialization, memory, and expertise. Keep \
     your responses relevant to your role and the ongoing discussion. Be detailed.";

/// Instruction sent after each exchange to refresh the agent's memory.
const REFLECT_INSTRUCTION: &str = "Reflect on the current conversation and task, and add to \
     your internal thoughts anything new you've learned or plan to remember for future \
     reference.";

/// Trim a completion and collapse embedded newlines to spaces.
///
/// Responses are stored as single transcript lines, so multi-line model
/// output must be flattened before it is recorded.
pub(crate) fn normalize_completion(text: &str) -> String {
    text.trim().replace('\n', " ")
}

/// Name and role of the peer an agent is currently exchanging with.
///
/// This is a snapshot, not a live reference: the prompt needs exactly these
/// two strings, and the field is scratch state for a single in-flight
/// collaboration. It is cleared before the call returns.
#[derive(Clone, Debug)]
pub struct PartnerProfile {
    /// Roster name of the partner.
    pub name: String,
    /// The partner's role description, embedded into the prompt so the agent
    /// knows who it is talking to.
    pub role: String,
}

/// Mutable agent state guarded by the per-agent lock.
struct AgentState {
    /// Append-only reflection log, one entry per completed collaboration
    /// step plus the initial reflection. Never trimmed or deduplicated.
    memory: Vec<String>,
    /// Append-only `"<name>: <content>"` entries, two per collaboration step
    /// (self first, then partner).
    transcript: Vec<String>,
    /// Scratch field naming the peer of the one in-flight collaboration.
    current_partner: Option<PartnerProfile>,
}

/// A named participant in a collaboration group.
///
/// Agents are constructed once per run with empty memory, transcript, and
/// path; [`generate_path`](Agent::generate_path) assigns the visiting order
/// before coordination begins, and the whole roster is discarded at end of
/// run. There is no persistence.
pub struct Agent {
    /// Unique roster name.
    pub name: String,
    /// Role description used as the head of every prompt.
    pub role: String,
    /// The shared task text, set once at construction.
    task: String,
    /// Gateway through which every completion request is issued.
    gateway: Arc<CompletionGateway>,
    /// Memory, transcript, and partner scratch, guarded together.
    state: RwLock<AgentState>,
    /// Visiting order over peer names. Fixed once generated; consumed in
    /// order by the coordinator.
    path: RwLock<Vec<String>>,
}

impl Agent {
    /// Create a new agent with empty memory, transcript, and path.
    pub fn new(
        name: impl Into<String>,
        role: impl Into<String>,
        task: impl Into<String>,
        gateway: Arc<CompletionGateway>,
    ) -> Self {
        Agent {
            name: name.into(),
            role: role.into(),
            task: task.into(),
            gateway,
            state: RwLock::new(AgentState {
                memory: Vec::new(),
                transcript: Vec::new(),
                current_partner: None,
            }),
            path: RwLock::new(Vec::new()),
        }
    }

    /// The shared task text this agent is working on.
    pub fn task(&self) -> &str {
        &self.task
    }

    /// Synthesize the contextual prompt from the agent's current state.
    ///
    /// Combines the fixed role and task text, the current partner's name and
    /// role (or `None`), an introduction-vs-collaboration framing chosen by
    /// whether a partner is set, and the full accumulated memory and
    /// transcript. Recomputed fresh for every request; reads state but never
    /// mutates it.
    pub async fn build_prompt(&self) -> String {
        let state = self.state.read().await;

        let (partner_name, partner_role) = match &state.current_partner {
            Some(partner) => (partner.name.as_str(), partner.role.as_str()),
            None => ("None", "None"),
        };

        let mut prompt = format!(
            "{} After reading through your role, memory, and conversation history, you will \
             respond to instructions given to you by 'Instruction:'. Task: {} You may or may \
             not have already spoken with other Agents. However, your current Agent that you \
             will collaborate with is: {}. This is your current partner's role: {}. ",
            self.role, self.task, partner_name, partner_role
        );

        if state.current_partner.is_none() {
            prompt.push_str(
                "You currently have no partner. Introduce yourself and lay out the foundation \
                 for how you would tackle the given task with your specialization and \
                 expertise. ",
            );
        } else {
            prompt.push_str("Collaborate on the given task with your partner. ");
        }

        prompt.push_str(&format!(
            "This is your inner memory and past thoughts: {:?} Your conversation history: {:?}",
            state.memory, state.transcript
        ));

        prompt
    }

    /// Issue a single completion request carrying `instruction`.
    ///
    /// This is the sole path by which an agent talks to the remote model:
    /// the contextual prompt is rebuilt, the instruction appended, and the
    /// trimmed response returned with embedded newlines collapsed to spaces.
    pub async fn issue(&self, instruction: &str) -> Result<String, CompletionError> {
        let prompt = format!(
            "{}\nInstruction: {}",
            self.build_prompt().await,
            instruction
        );
        let response = self.gateway.complete(&prompt).await?;
        Ok(normalize_completion(&response))
    }

    /// Produce this agent's reply within an exchange initiated by a peer.
    ///
    /// The agent answers from its own memory and transcript only: the offered
    /// conversation snapshot and the initiating partner are not consulted,
    /// and nothing is appended to this agent's transcript. Only the initiator
    /// records the exchange.
    pub async fn reply(
        &self,
        _conversation: &str,
        _partner: &Agent,
    ) -> Result<String, CompletionError> {
        self.issue(REPLY_INSTRUCTION).await
    }

    /// Reflect on the conversation so far and append the result to memory.
    ///
    /// Called once at the very start of an agent's path execution and again
    /// after every collaboration step.
    pub async fn update_memory(&self) -> Result<(), CompletionError> {
        let reflection = self.issue(REFLECT_INSTRUCTION).await?;
        self.state.write().await.memory.push(reflection);
        Ok(())
    }

    /// Perform one pairwise collaboration step with `partner`.
    ///
    /// The agent's own contribution is always generated strictly before the
    /// partner's reply is requested. Both halves are appended to this agent's
    /// transcript together, followed by a memory update. The partner's
    /// transcript and memory are untouched.
    ///
    /// `current_partner` is cleared on every exit path, including a failed
    /// contribution, reply, or memory update, so no concurrent reader can
    /// observe a stale partner once this call returns.
    pub async fn collaborate_with(&self, partner: &Agent) -> Result<(), CompletionError> {
        {
            let mut state = self.state.write().await;
            state.current_partner = Some(PartnerProfile {
                name: partner.name.clone(),
                role: partner.role.clone(),
            });
        }

        let result = self.run_exchange(partner).await;

        self.state.write().await.current_partner = None;
        result
    }

    /// Fallible body of a collaboration step, wrapped by
    /// [`collaborate_with`](Agent::collaborate_with) so the partner field is
    /// cleared no matter where this returns.
    async fn run_exchange(&self, partner: &Agent) -> Result<(), CompletionError> {
        // Snapshot taken before our contribution is appended.
        let conversation = self.state.read().await.transcript.join("\n");

        let own_response = self.issue(CONTRIBUTE_INSTRUCTION).await?;
        let partner_response = partner.reply(&conversation, self).await?;

        let entries = {
            let mut state = self.state.write().await;
            state
                .transcript
                .push(format!("{}: {}", self.name, own_response));
            state
                .transcript
                .push(format!("{}: {}", partner.name, partner_response));
            state.transcript.len()
        };

        log::debug!(
            "{} recorded an exchange with {} ({} transcript entries)",
            self.name,
            partner.name,
            entries
        );

        self.update_memory().await
    }

    /// Assign this agent a uniformly random visiting order over `roster`,
    /// excluding its own name.
    ///
    /// Must be called exactly once before coordination begins. The random
    /// source is injectable so tests can seed it; production callers
    /// typically go through [`Group::generate_paths`](crate::Group::generate_paths).
    pub async fn generate_path<R: Rng + ?Sized>(&self, roster: &[String], rng: &mut R) {
        let mut path: Vec<String> = roster
            .iter()
            .filter(|name| name.as_str() != self.name)
            .cloned()
            .collect();
        path.shuffle(rng);
        *self.path.write().await = path;
    }

    /// Snapshot of the visiting order.
    pub async fn path(&self) -> Vec<String> {
        self.path.read().await.clone()
    }

    /// Snapshot of the private memory log.
    pub async fn memory(&self) -> Vec<String> {
        self.state.read().await.memory.clone()
    }

    /// Snapshot of the conversation transcript.
    pub async fn transcript(&self) -> Vec<String> {
        self.state.read().await.transcript.clone()
    }

    /// The partner of the in-flight collaboration, if one is running.
    pub async fn current_partner(&self) -> Option<PartnerProfile> {
        self.state.read().await.current_partner.clone()
    }

    /// Render the transcript as a printable report.
    pub async fn conversation_report(&self) -> String {
        let state = self.state.read().await;
        let mut report = format!("Conversation History for {}:\n", self.name);
        for entry in &state.transcript {
            report.push_str(entry);
            report.push('\n');
        }
        report
    }
}
