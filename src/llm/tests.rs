use std::time::Duration;

use super::groq::GroqProvider;
use super::provider::LlmProvider;
use super::types::{ChatMessage, ChatRequest};

#[tokio::test]
#[ignore]
async fn live_groq_chat_roundtrip() {
    let api_key = match std::env::var("GROQ_API_KEY") {
        Ok(key) => key,
        Err(_) => {
            eprintln!("GROQ_API_KEY not set, skipping live test");
            return;
        }
    };

    let provider = GroqProvider::new(
        "https://api.groq.com/openai".to_string(),
        api_key,
        Duration::from_secs(30),
    );

    assert!(provider.health_check().await.unwrap_or(false));

    let request = ChatRequest {
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content: "Say hello in one word.".to_string(),
        }],
        temperature: Some(0.0),
        max_tokens: Some(10),
        stop: None,
    };

    let answer = provider
        .chat(request, "llama3-8b-8192")
        .await
        .expect("live chat call");
    assert!(!answer.trim().is_empty());
}
