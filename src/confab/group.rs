//! Group coordination
//!
//! This module provides the [`Group`] coordinator: it owns the full agent
//! roster and the shared task description, and drives each agent through its
//! entire planned path of pairwise collaborations.
//!
//! # Concurrency model
//!
//! [`Group::conduct_collaborations`] launches one tokio task per agent. A
//! single agent's own path steps execute strictly in sequence (step k+1
//! never starts before step k fully completes, including its memory update)
//! while different agents' sequences interleave freely. A given agent may
//! simultaneously be the initiator of its own sequence and the partner
//! inside another agent's; each agent's internal lock keeps the individual
//! reads and appends atomic across both call sites, and no ordering is
//! guaranteed between sequences.
//!
//! The only other synchronized shared resource is the
//! [`CompletionGateway`](crate::CompletionGateway)'s slot pool, which every
//! sequence's remote calls funnel through.
//!
//! # Failure semantics
//!
//! A failing remote call aborts the affected agent's remaining path. The
//! other sequences are unaffected and run to completion; once everything has
//! settled, [`Group::conduct_collaborations`] reports *all* sequence
//! failures. There are no retries and no rollback: a failed agent's memory
//! and transcript keep their last-known state.

use crate::confab::agent::Agent;
use crate::confab::gateway::CompletionGateway;
use crate::confab::roles::TaskPlan;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use rand::Rng;
use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// One failed collaboration sequence, by agent name.
#[derive(Debug, Clone)]
pub struct SequenceFailure {
    /// Name of the agent whose sequence aborted.
    pub agent: String,
    /// Rendered error that aborted the sequence.
    pub error: String,
}

/// Errors that can occur during group configuration or execution.
///
/// # Examples
///
/// ```
/// use confab::GroupError;
///
/// let err = GroupError::AgentNotFound("missing-agent".into());
/// assert_eq!(err.to_string(), "Agent not found: missing-agent");
/// ```
#[derive(Debug, Clone)]
pub enum GroupError {
    /// A path entry names a peer not present in the roster. Surfaced as a
    /// configuration error, never silently skipped.
    AgentNotFound(String),

    /// Two roster members share a name.
    DuplicateAgent(String),

    /// [`Group::conduct_collaborations`] was called on an empty roster.
    NoAgents,

    /// A single collaboration step failed; aborts that agent's remaining
    /// path.
    StepFailed {
        /// Agent whose sequence the failure belongs to.
        agent: String,
        /// The completion failure, rendered.
        message: String,
    },

    /// One or more sequences failed. Reported only after every sequence has
    /// settled, and carries every failure.
    SequencesFailed(Vec<SequenceFailure>),

    /// A runtime failure while gathering sequences (e.g. a tokio join
    /// error).
    ExecutionFailed(String),
}

impl fmt::Display for GroupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupError::AgentNotFound(name) => write!(f, "Agent not found: {}", name),
            GroupError::DuplicateAgent(name) => write!(f, "Duplicate agent name: {}", name),
            GroupError::NoAgents => write!(f, "No agents in group"),
            GroupError::StepFailed { agent, message } => {
                write!(f, "Collaboration step failed for {}: {}", agent, message)
            }
            GroupError::SequencesFailed(failures) => {
                write!(f, "{} collaboration sequence(s) failed:", failures.len())?;
                for failure in failures {
                    write!(f, " [{}: {}]", failure.agent, failure.error)?;
                }
                Ok(())
            }
            GroupError::ExecutionFailed(msg) => write!(f, "Execution failed: {}", msg),
        }
    }
}

impl Error for GroupError {}

/// Summary returned when every collaboration sequence completed.
#[derive(Debug, Clone)]
pub struct CollaborationReport {
    /// When the fan-out started.
    pub started_at: DateTime<Utc>,
    /// When the last sequence settled.
    pub completed_at: DateTime<Utc>,
    /// Names of the agents whose sequences completed, in roster order.
    pub completed: Vec<String>,
}

/// Coordinator owning the agent roster and the shared task.
///
/// The group holds no shared mutable state beyond roster membership itself;
/// all mutation happens inside individual [`Agent`] instances.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use confab::clients::openai::{Model, OpenAIClient};
/// use confab::{Agent, CompletionGateway, Group};
///
/// # async {
/// let client = Arc::new(OpenAIClient::new_with_model_enum("key", Model::GPT35Turbo));
/// let gateway = Arc::new(CompletionGateway::new(client));
/// let task = "Design a rate limiter.";
///
/// let group = Group::new(
///     task,
///     vec![
///         Arc::new(Agent::new("Alice", "You are an expert in concurrency.", task, Arc::clone(&gateway))),
///         Arc::new(Agent::new("Bob", "You are an expert in networking.", task, gateway)),
///     ],
/// )?;
///
/// group.generate_paths().await;
/// let report = group.conduct_collaborations().await?;
/// println!("{} sequences completed", report.completed.len());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// # };
/// ```
#[derive(Clone)]
pub struct Group {
    /// The immutable task string shared by the roster.
    task: String,
    /// Roster members, names unique.
    agents: Vec<Arc<Agent>>,
}

impl std::fmt::Debug for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group")
            .field("task", &self.task)
            .field(
                "agents",
                &self.agents.iter().map(|a| &a.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Group {
    /// Create a group from a task and a roster. Rejects duplicate names.
    pub fn new(task: impl Into<String>, agents: Vec<Arc<Agent>>) -> Result<Self, GroupError> {
        let mut seen = HashSet::new();
        for agent in &agents {
            if !seen.insert(agent.name.clone()) {
                return Err(GroupError::DuplicateAgent(agent.name.clone()));
            }
        }
        Ok(Group {
            task: task.into(),
            agents,
        })
    }

    /// Build a roster from explicit `(name, role)` pairs, all sharing `task`
    /// and `gateway`.
    pub fn from_roster(
        task: impl Into<String>,
        roster: Vec<(String, String)>,
        gateway: Arc<CompletionGateway>,
    ) -> Result<Self, GroupError> {
        let task = task.into();
        let agents = roster
            .into_iter()
            .map(|(name, role)| {
                Arc::new(Agent::new(name, role, task.clone(), Arc::clone(&gateway)))
            })
            .collect();
        Self::new(task, agents)
    }

    /// Build a roster from a [`TaskPlan`]: one agent per derived role, named
    /// `Agent 1..=N`, all sharing the plan's expanded task and `gateway`.
    pub fn from_plan(plan: &TaskPlan, gateway: Arc<CompletionGateway>) -> Result<Self, GroupError> {
        let agents = plan
            .roles
            .iter()
            .enumerate()
            .map(|(index, role)| {
                Arc::new(Agent::new(
                    format!("Agent {}", index + 1),
                    role.clone(),
                    plan.expanded_task.clone(),
                    Arc::clone(&gateway),
                ))
            })
            .collect();
        Self::new(plan.expanded_task.clone(), agents)
    }

    /// The shared task text.
    pub fn task(&self) -> &str {
        &self.task
    }

    /// The roster.
    pub fn agents(&self) -> &[Arc<Agent>] {
        &self.agents
    }

    /// Look up a roster member by name.
    pub fn agent(&self, name: &str) -> Option<&Arc<Agent>> {
        self.agents.iter().find(|agent| agent.name == name)
    }

    /// All roster names, in insertion order.
    pub fn roster_names(&self) -> Vec<String> {
        self.agents.iter().map(|agent| agent.name.clone()).collect()
    }

    /// Assign every agent a random path using the thread-local rng.
    pub async fn generate_paths(&self) {
        let mut rng = rand::thread_rng();
        self.generate_paths_with(&mut rng).await;
    }

    /// Assign every agent a random path from an injected rng, so tests can
    /// seed the visiting orders.
    pub async fn generate_paths_with<R: Rng + ?Sized>(&self, rng: &mut R) {
        let names = self.roster_names();
        for agent in &self.agents {
            agent.generate_path(&names, rng).await;
        }
    }

    /// Run one agent's entire planned path, strictly in order.
    ///
    /// Performs the initial memory update, then resolves each path entry to
    /// its roster agent and collaborates with it. Each step fully completes,
    /// partner reply and memory update included, before the next begins.
    pub async fn execute_path(&self, agent: &Arc<Agent>) -> Result<(), GroupError> {
        agent
            .update_memory()
            .await
            .map_err(|err| GroupError::StepFailed {
                agent: agent.name.clone(),
                message: err.to_string(),
            })?;

        for partner_name in agent.path().await {
            let partner = self
                .agent(&partner_name)
                .ok_or_else(|| GroupError::AgentNotFound(partner_name.clone()))?;
            agent
                .collaborate_with(partner)
                .await
                .map_err(|err| GroupError::StepFailed {
                    agent: agent.name.clone(),
                    message: err.to_string(),
                })?;
        }
        Ok(())
    }

    /// Launch every agent's path concurrently and wait for all of them to
    /// settle.
    ///
    /// Returns a [`CollaborationReport`] when every sequence completed, or
    /// [`GroupError::SequencesFailed`] listing every aborted sequence. One
    /// agent's failure never interrupts the others.
    pub async fn conduct_collaborations(&self) -> Result<CollaborationReport, GroupError> {
        if self.agents.is_empty() {
            return Err(GroupError::NoAgents);
        }

        let started_at = Utc::now();
        log::info!(
            "Conducting collaborations across {} agents",
            self.agents.len()
        );

        let mut handles = Vec::with_capacity(self.agents.len());
        for agent in &self.agents {
            let group = self.clone();
            let agent = Arc::clone(agent);
            handles.push(tokio::spawn(async move {
                let name = agent.name.clone();
                let outcome = group.execute_path(&agent).await;
                (name, outcome)
            }));
        }

        let mut completed = Vec::new();
        let mut failures = Vec::new();
        for joined in join_all(handles).await {
            match joined {
                Ok((name, Ok(()))) => completed.push(name),
                Ok((name, Err(err))) => {
                    log::warn!("Collaboration sequence for {} aborted: {}", name, err);
                    failures.push(SequenceFailure {
                        agent: name,
                        error: err.to_string(),
                    });
                }
                Err(join_err) => {
                    return Err(GroupError::ExecutionFailed(format!(
                        "Task join error: {}",
                        join_err
                    )));
                }
            }
        }

        if !failures.is_empty() {
            return Err(GroupError::SequencesFailed(failures));
        }

        let completed_at = Utc::now();
        log::info!(
            "All {} collaboration sequences completed in {}ms",
            completed.len(),
            (completed_at - started_at).num_milliseconds()
        );

        Ok(CollaborationReport {
            started_at,
            completed_at,
            completed,
        })
    }

    /// Render every agent's conversation transcript as a printable report.
    pub async fn conversation_reports(&self) -> Vec<String> {
        let mut reports = Vec::with_capacity(self.agents.len());
        for agent in &self.agents {
            reports.push(agent.conversation_report().await);
        }
        reports
    }
}

#[cfg(test)]
mod tests {
    use super::{GroupError, SequenceFailure};

    #[test]
    fn test_sequences_failed_display_lists_every_agent() {
        let err = GroupError::SequencesFailed(vec![
            SequenceFailure {
                agent: "Alice".into(),
                error: "boom".into(),
            },
            SequenceFailure {
                agent: "Bob".into(),
                error: "bust".into(),
            },
        ]);
        let rendered = err.to_string();
        assert!(rendered.contains("2 collaboration sequence(s) failed"));
        assert!(rendered.contains("Alice: boom"));
        assert!(rendered.contains("Bob: bust"));
    }
}
