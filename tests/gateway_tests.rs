use async_trait::async_trait;
use confab::client_wrapper::{ClientWrapper, CompletionError, CompletionOptions, Message, Role};
use confab::{CompletionGateway, GatewayConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Client whose calls block until the test releases them, so the test can
/// observe exactly how many requests the gateway has admitted.
struct GatedClient {
    started: AtomicUsize,
    release: Semaphore,
}

#[async_trait]
impl ClientWrapper for GatedClient {
    async fn send_message(
        &self,
        _messages: &[Message],
        _options: &CompletionOptions,
    ) -> Result<Message, CompletionError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let permit = self.release.acquire().await.unwrap();
        permit.forget();
        Ok(Message {
            role: Role::Assistant,
            content: Arc::from("ok"),
        })
    }

    fn model_name(&self) -> &str {
        "gated"
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
async fn test_gateway_never_exceeds_slot_count() {
    let client = Arc::new(GatedClient {
        started: AtomicUsize::new(0),
        release: Semaphore::new(0),
    });
    let gateway = Arc::new(CompletionGateway::with_config(
        client.clone(),
        GatewayConfig {
            max_in_flight: 2,
            ..GatewayConfig::default()
        },
    ));

    let mut handles = Vec::new();
    for _ in 0..3 {
        let gateway = Arc::clone(&gateway);
        handles.push(tokio::spawn(async move { gateway.complete("prompt").await }));
    }

    // Two calls get slots immediately; the third must wait.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(client.started.load(Ordering::SeqCst), 2);
    assert_eq!(gateway.available_slots(), 0);

    // Finishing one in-flight call frees a slot for the waiting caller.
    client.release.add_permits(1);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(client.started.load(Ordering::SeqCst), 3);

    client.release.add_permits(2);
    for handle in handles {
        let text = handle.await.unwrap().unwrap();
        assert_eq!(text, "ok");
    }
    assert_eq!(gateway.available_slots(), 2);
}

#[tokio::test]
async fn test_slot_released_when_call_fails() {
    let gateway = CompletionGateway::with_config(
        Arc::new(FailingClient),
        GatewayConfig {
            max_in_flight: 1,
            ..GatewayConfig::default()
        },
    );

    // With a single slot, a leak on the failure path would deadlock the
    // second call instead of failing it.
    for _ in 0..2 {
        let err = gateway.complete("prompt").await.unwrap_err();
        assert!(matches!(err, CompletionError::Transient(_)));
    }
    assert_eq!(gateway.available_slots(), 1);
}

#[tokio::test]
async fn test_gateway_reports_client_model() {
    let gateway = CompletionGateway::new(Arc::new(FailingClient));
    assert_eq!(gateway.model_name(), "failing");
    assert_eq!(gateway.options().model, "gpt-3.5-turbo");
}
