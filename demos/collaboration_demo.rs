//! End-to-end collaboration run against a live OpenAI-compatible endpoint.
//!
//! Expands a raw prompt into a task plan, builds one expert agent per topic,
//! lets every agent walk its random path of pairwise collaborations, and
//! prints the resulting conversation transcripts.
//!
//! Usage:
//! ```bash
//! export OPENAI_API_KEY=sk-...
//! cargo run --example collaboration_demo
//! ```

use confab::clients::openai::{Model, OpenAIClient};
use confab::{CompletionGateway, GatewayConfig, Group, TaskPlanner};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    confab::init_logger();

    let api_key = std::env::var("OPENAI_API_KEY")
        .expect("OPENAI_API_KEY must be set to run the collaboration demo");
    let user_prompt = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Design a rate limiter for a public HTTP API".to_string());

    let client = Arc::new(OpenAIClient::new_with_model_enum(&api_key, Model::GPT35Turbo));
    let gateway = Arc::new(CompletionGateway::with_config(
        client,
        GatewayConfig::default(),
    ));

    println!("Planning task from prompt: {}", user_prompt);
    let plan = TaskPlanner::new(Arc::clone(&gateway))
        .plan(&user_prompt)
        .await?;
    println!("Expanded task: {}", plan.expanded_task);
    println!("Topics: {}", plan.topics.join(", "));

    let group = Group::from_plan(&plan, gateway)?;
    group.generate_paths().await;

    println!(
        "Conducting collaborations across {} agents...",
        group.agents().len()
    );
    let report = group.conduct_collaborations().await?;
    println!(
        "{} sequences completed between {} and {}",
        report.completed.len(),
        report.started_at,
        report.completed_at
    );

    for conversation in group.conversation_reports().await {
        println!("\n{}", conversation);
    }

    Ok(())
}
