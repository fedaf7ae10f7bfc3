use async_trait::async_trait;
use confab::client_wrapper::{ClientWrapper, CompletionError, CompletionOptions, Message, Role};
use confab::{CompletionGateway, TaskPlanner};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Replays a fixed script of responses and records every prompt it receives.
struct ScriptedClient {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    fn new(responses: &[&str]) -> Self {
        ScriptedClient {
            responses: Mutex::new(responses.iter().map(|r| r.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ClientWrapper for ScriptedClient {
    async fn send_message(
        &self,
        messages: &[Message],
        _options: &CompletionOptions,
    ) -> Result<Message, CompletionError> {
        let prompt = messages
            .first()
            .map(|msg| msg.content.to_string())
            .unwrap_or_default();
        self.prompts.lock().await.push(prompt);

        let response = self
            .responses
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| CompletionError::Permanent("script exhausted".to_string()))?;
        Ok(Message {
            role: Role::Assistant,
            content: Arc::from(response.as_str()),
        })
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

struct FailingClient;

#[async_trait]
impl ClientWrapper for FailingClient {
    async fn send_message(
        &self,
        _messages: &[Message],
        _options: &CompletionOptions,
    ) -> Result<Message, CompletionError> {
        Err(CompletionError::Transient("synthetic outage".to_string()))
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}

#[tokio::test]
async fn test_plan_expands_prompt_and_derives_roles() {
    let client = Arc::new(ScriptedClient::new(&[
        "  A sharper task statement.\n",
        "token buckets, sliding windows , burst control, ",
    ]));
    let gateway = Arc::new(CompletionGateway::new(client.clone()));

    let plan = TaskPlanner::new(gateway)
        .plan("make a rate limiter")
        .await
        .unwrap();

    assert_eq!(plan.expanded_task, "A sharper task statement.");
    assert_eq!(
        plan.topics,
        vec!["token buckets", "sliding windows", "burst control"]
    );
    assert_eq!(plan.roles.len(), 3);
    assert_eq!(
        plan.roles[0],
        "You are Agent 1. You are an expert in token buckets."
    );

    // First call carries the user prompt; second carries the expanded task.
    let prompts = client.prompts.lock().await;
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("Expand on the prompt"));
    assert!(prompts[0].contains("make a rate limiter"));
    assert!(prompts[1].contains("comma-separated"));
    assert!(prompts[1].contains("A sharper task statement."));
}

#[tokio::test]
async fn test_plan_propagates_completion_failure() {
    let gateway = Arc::new(CompletionGateway::new(Arc::new(FailingClient)));
    let err = TaskPlanner::new(gateway).plan("anything").await.unwrap_err();
    assert!(matches!(err, CompletionError::Transient(_)));
}
