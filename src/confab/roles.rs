//! Task planning
//!
//! Turns a raw user prompt into the parameters a collaboration run needs:
//! an expanded task statement, the key topics it should cover, and one
//! expert role per topic. Both planning calls are simple single-shot uses of
//! the same [`CompletionGateway`](crate::CompletionGateway) the agents share,
//! so they count against the same admission gate.

use crate::confab::agent::normalize_completion;
use crate::confab::client_wrapper::CompletionError;
use crate::confab::gateway::CompletionGateway;
use std::sync::Arc;

const EXPAND_INSTRUCTION: &str = "You will be given a prompt. Expand on the prompt and create \
     a new prompt. This expanded task should delve deeper into the user's initial request, \
     providing clarity, focus, and direction. Ensure your expansion maintains consistency \
     with the original prompt and enhances its conciseness and specificity. Your response \
     should only be the new prompt, nothing else.";

const TOPICS_INSTRUCTION: &str = "Given the following prompt, list out the key topics that \
     should be addressed. Only provide the topics in your response. List the topics as a \
     comma-separated list and do not number them.";

/// Output of [`TaskPlanner::plan`].
#[derive(Debug, Clone)]
pub struct TaskPlan {
    /// The sharpened task statement every agent will work on.
    pub expanded_task: String,
    /// Key topics extracted from the expanded task.
    pub topics: Vec<String>,
    /// One role string per topic, in topic order:
    /// `"You are Agent N. You are an expert in <topic>."`
    pub roles: Vec<String>,
}

/// Derives a [`TaskPlan`] from a raw user prompt.
pub struct TaskPlanner {
    gateway: Arc<CompletionGateway>,
}

impl TaskPlanner {
    /// Create a planner issuing its calls through `gateway`.
    pub fn new(gateway: Arc<CompletionGateway>) -> Self {
        TaskPlanner { gateway }
    }

    /// Expand `user_prompt`, extract its topics, and derive expert roles.
    ///
    /// Empty topic segments are dropped and surrounding whitespace trimmed,
    /// so a trailing comma in the model's list does not produce a blank role.
    pub async fn plan(&self, user_prompt: &str) -> Result<TaskPlan, CompletionError> {
        let expanded_raw = self
            .gateway
            .complete(&format!(
                "{} \n User Prompt: {}",
                EXPAND_INSTRUCTION, user_prompt
            ))
            .await?;
        let expanded_task = normalize_completion(&expanded_raw);

        let topics_raw = self
            .gateway
            .complete(&format!("{}\nPrompt: {}", TOPICS_INSTRUCTION, expanded_task))
            .await?;
        let topics: Vec<String> = normalize_completion(&topics_raw)
            .split(',')
            .map(str::trim)
            .filter(|topic| !topic.is_empty())
            .map(ToString::to_string)
            .collect();

        let roles = topics
            .iter()
            .enumerate()
            .map(|(index, topic)| {
                format!(
                    "You are Agent {}. You are an expert in {}.",
                    index + 1,
                    topic
                )
            })
            .collect();

        log::info!(
            "Planned task with {} topic(s) from prompt ({} chars)",
            topics.len(),
            user_prompt.len()
        );

        Ok(TaskPlan {
            expanded_task,
            topics,
            roles,
        })
    }
}
