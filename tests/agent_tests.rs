use async_trait::async_trait;
use confab::client_wrapper::{ClientWrapper, CompletionError, CompletionOptions, Message, Role};
use confab::{Agent, CompletionGateway};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

struct MockClient {
    response: String,
}

#[async_trait]
impl ClientWrapper for MockClient {
    async fn send_message(
        &self,
        _messages: &[Message],
        _options: &CompletionOptions,
    ) -> Result<Message, CompletionError> {
        Ok(Message {
            role: Role::Assistant,
            content: Arc::from(self.response.as_str()),
        })
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

/// Records every prompt it receives so tests can inspect what an agent sent.
struct RecordingClient {
    response: String,
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl ClientWrapper for RecordingClient {
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
        Ok(Message {
            role: Role::Assistant,
            content: Arc::from(self.response.as_str()),
        })
    }

    fn model_name(&self) -> &str {
        "recording"
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
        Err(CompletionError::Permanent("service down".to_string()))
    }

    fn model_name(&self) -> &str {
        "failing"
    }
}

fn mock_gateway(response: &str) -> Arc<CompletionGateway> {
    Arc::new(CompletionGateway::new(Arc::new(MockClient {
        response: response.to_string(),
    })))
}

#[tokio::test]
async fn test_generate_path_is_permutation_excluding_self() {
    let gateway = mock_gateway("ok");
    let agent = Agent::new("Agent 3", "You are Agent 3.", "task", gateway);

    let roster: Vec<String> = (1..=6).map(|i| format!("Agent {}", i)).collect();
    let mut rng = StdRng::seed_from_u64(7);
    agent.generate_path(&roster, &mut rng).await;

    let path = agent.path().await;
    assert_eq!(path.len(), roster.len() - 1);
    assert!(!path.contains(&"Agent 3".to_string()));

    let unique: HashSet<&String> = path.iter().collect();
    assert_eq!(unique.len(), path.len());
    for name in roster.iter().filter(|name| name.as_str() != "Agent 3") {
        assert!(path.contains(name), "path is missing {}", name);
    }
}

#[tokio::test]
async fn test_seeded_paths_are_reproducible() {
    let gateway = mock_gateway("ok");
    let roster: Vec<String> = (1..=5).map(|i| format!("Agent {}", i)).collect();

    let first = Agent::new("Agent 1", "role", "task", Arc::clone(&gateway));
    let second = Agent::new("Agent 1", "role", "task", gateway);

    let mut rng = StdRng::seed_from_u64(99);
    first.generate_path(&roster, &mut rng).await;
    let mut rng = StdRng::seed_from_u64(99);
    second.generate_path(&roster, &mut rng).await;

    assert_eq!(first.path().await, second.path().await);
}

#[tokio::test]
async fn test_build_prompt_is_pure() {
    let gateway = mock_gateway("ok");
    let agent = Agent::new(
        "Alice",
        "You are an expert in concurrency.",
        "Design a rate limiter.",
        gateway,
    );

    let first = agent.build_prompt().await;
    let second = agent.build_prompt().await;
    assert_eq!(first, second);

    // With no partner set, the prompt frames an introduction.
    assert!(first.contains("You currently have no partner."));
    assert!(first.contains("Design a rate limiter."));
    assert!(first.contains("You are an expert in concurrency."));
}

#[tokio::test]
async fn test_issue_appends_instruction_and_normalizes() {
    let client = Arc::new(RecordingClient {
        response: "  first line\nsecond line ".to_string(),
        prompts: Mutex::new(Vec::new()),
    });
    let gateway = Arc::new(CompletionGateway::new(client.clone()));
    let agent = Agent::new("Alice", "You are terse.", "task", gateway);

    let response = agent.issue("Do the thing.").await.unwrap();
    assert_eq!(response, "first line second line");

    let prompts = client.prompts.lock().await;
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].ends_with("\nInstruction: Do the thing."));
    assert!(prompts[0].contains("You are terse."));
}

#[tokio::test]
async fn test_collaboration_updates_initiator_only() {
    let gateway = mock_gateway("ok");
    let alice = Agent::new("Alice", "role a", "task", Arc::clone(&gateway));
    let bob = Agent::new("Bob", "role b", "task", gateway);

    alice.collaborate_with(&bob).await.unwrap();

    assert_eq!(alice.transcript().await, vec!["Alice: ok", "Bob: ok"]);
    assert_eq!(alice.memory().await.len(), 1);

    // The partner's state is untouched by the initiator's step.
    assert!(bob.transcript().await.is_empty());
    assert!(bob.memory().await.is_empty());
}

#[tokio::test]
async fn test_current_partner_cleared_after_collaboration() {
    let gateway = mock_gateway("ok");
    let alice = Agent::new("Alice", "role a", "task", Arc::clone(&gateway));
    let bob = Agent::new("Bob", "role b", "task", gateway);

    assert!(alice.current_partner().await.is_none());
    alice.collaborate_with(&bob).await.unwrap();
    assert!(alice.current_partner().await.is_none());
}

#[tokio::test]
async fn test_current_partner_cleared_when_step_fails() {
    let gateway = Arc::new(CompletionGateway::new(Arc::new(FailingClient)));
    let alice = Agent::new("Alice", "role a", "task", Arc::clone(&gateway));
    let bob = Agent::new("Bob", "role b", "task", gateway);

    let err = alice.collaborate_with(&bob).await.unwrap_err();
    assert!(matches!(err, CompletionError::Permanent(_)));

    assert!(alice.current_partner().await.is_none());
    assert!(alice.transcript().await.is_empty());
    assert!(alice.memory().await.is_empty());
}

#[tokio::test]
async fn test_reply_ignores_offered_transcript() {
    let client = Arc::new(RecordingClient {
        response: "ok".to_string(),
        prompts: Mutex::new(Vec::new()),
    });
    let gateway = Arc::new(CompletionGateway::new(client.clone()));
    let alice = Agent::new("Alice", "role a", "task", Arc::clone(&gateway));
    let bob = Agent::new("Bob", "role b", "task", gateway);

    let response = bob.reply("SENTINEL TRANSCRIPT", &alice).await.unwrap();
    assert_eq!(response, "ok");

    // The reply is built from Bob's own state; the offered snapshot never
    // reaches the model.
    let prompts = client.prompts.lock().await;
    assert_eq!(prompts.len(), 1);
    assert!(!prompts[0].contains("SENTINEL TRANSCRIPT"));
    assert!(prompts[0].contains("role b"));
}

#[tokio::test]
async fn test_conversation_report_headers_transcript() {
    let gateway = mock_gateway("ok");
    let alice = Agent::new("Alice", "role a", "task", Arc::clone(&gateway));
    let bob = Agent::new("Bob", "role b", "task", gateway);

    alice.collaborate_with(&bob).await.unwrap();

    let report = alice.conversation_report().await;
    assert!(report.starts_with("Conversation History for Alice:\n"));
    assert!(report.contains("Alice: ok\n"));
    assert!(report.contains("Bob: ok\n"));
}
