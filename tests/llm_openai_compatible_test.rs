// ABOUTME: Integration tests for the OpenAI-compatible client against a mock HTTP provider
// ABOUTME: Covers model listing, completions, streaming batches, error mapping, and cancellation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::time::Duration;

use common::{delta_event, unreachable_base_url, ChatBehavior, MockProvider};
use llm_chat_core::cancellation::CancellationToken;
use llm_chat_core::config::{LlmConfiguration, LlmProvider};
use llm_chat_core::errors::{ErrorCategory, ErrorCode};
use llm_chat_core::llm::{CompletionOutcome, LlmClient, OpenAiCompatibleClient};
use llm_chat_core::models::{
    ChatCompletionChunk, ChatMessage, ChatRequest, GenerateImageRequest, ImageSize, Model,
};

fn ollama_client(base_url: &str) -> OpenAiCompatibleClient {
    OpenAiCompatibleClient::new(LlmConfiguration::self_hosted(Some(base_url))).unwrap()
}

fn openai_client(base_url: &str) -> OpenAiCompatibleClient {
    let config = LlmConfiguration::cloud("sk-test")
        .with_base_url(base_url)
        .with_organization("org-42");
    OpenAiCompatibleClient::new(config).unwrap()
}

fn hello_request() -> ChatRequest {
    ChatRequest::new(vec![ChatMessage::user("Hello")])
}

// =============================================================================
// Model listing and selection
// =============================================================================

#[tokio::test]
async fn test_list_models_populates_cache() {
    let mock = MockProvider::default();
    let client = ollama_client(&mock.clone().spawn().await);

    assert!(client.cached_models().is_none());
    let models = client.list_models().await.unwrap();

    assert_eq!(models.data.len(), 2);
    assert_eq!(models.data[0].id, "llama3.2");
    assert_eq!(client.cached_models(), Some(models));
    assert_eq!(mock.hits(), 1);
}

#[tokio::test]
async fn test_set_active_model_is_not_validated_and_makes_no_request() {
    let mock = MockProvider::default();
    let client = ollama_client(&mock.clone().spawn().await);

    client.set_active_model(Model::from_id("not-listed-anywhere"));

    assert_eq!(client.active_model().unwrap().id, "not-listed-anywhere");
    assert_eq!(mock.hits(), 0);
}

#[tokio::test]
async fn test_transport_failure_is_categorised() {
    let client = ollama_client(&unreachable_base_url().await);

    let error = client.list_models().await.unwrap_err();

    assert_eq!(error.category(), ErrorCategory::Transport);
    assert!(error.message.contains("Cannot connect"), "{}", error.message);
    assert!(client.cached_models().is_none());
}

// =============================================================================
// Non-streaming completions
// =============================================================================

#[tokio::test]
async fn test_completion_uses_active_model_when_request_names_none() {
    let mock = MockProvider::default();
    let client = ollama_client(&mock.clone().spawn().await);
    client.set_active_model(Model::from_id("llama3.2"));

    let outcome = client
        .create_completion(&hello_request(), None, None)
        .await
        .unwrap();

    let completion = outcome.into_completion().unwrap();
    assert_eq!(completion.first_content(), Some("Hello from the mock"));
    assert_eq!(completion.model, "llama3.2");
    assert_eq!(mock.last_body()["model"], "llama3.2");
    assert_eq!(mock.last_body()["messages"][0]["role"], "user");
}

#[tokio::test]
async fn test_request_model_overrides_active_model() {
    let mock = MockProvider::default();
    let client = ollama_client(&mock.clone().spawn().await);
    client.set_active_model(Model::from_id("llama3.2"));

    let request = hello_request().with_model("qwen2.5:7b");
    client.create_completion(&request, None, None).await.unwrap();

    assert_eq!(mock.last_body()["model"], "qwen2.5:7b");
}

#[tokio::test]
async fn test_missing_model_fails_before_any_request() {
    let mock = MockProvider::default();
    let client = ollama_client(&mock.clone().spawn().await);

    let error = client
        .create_completion(&hello_request(), None, None)
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::InvalidInput);
    assert!(error.message.contains("Model not set"));
    assert_eq!(mock.hits(), 0);
}

#[tokio::test]
async fn test_cloud_requests_carry_bearer_and_organization() {
    let mock = MockProvider::default();
    let client = openai_client(&mock.clone().spawn().await);

    client.list_models().await.unwrap();

    assert_eq!(
        mock.last_header("authorization").as_deref(),
        Some("Bearer sk-test")
    );
    assert_eq!(mock.last_header("openai-organization").as_deref(), Some("org-42"));
}

// =============================================================================
// Error responses
// =============================================================================

#[tokio::test]
async fn test_structured_error_body_becomes_protocol_error() {
    let mock = MockProvider {
        chat: ChatBehavior::Fail {
            status: 401,
            body: r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error","param":null,"code":"invalid_api_key"}}"#.to_owned(),
        },
        ..MockProvider::default()
    };
    let client = openai_client(&mock.clone().spawn().await);
    let request = hello_request().with_model("gpt-4o");

    let error = client.create_completion(&request, None, None).await.unwrap_err();

    assert_eq!(error.category(), ErrorCategory::Protocol);
    assert_eq!(error.code, ErrorCode::ExternalAuthFailed);
    assert_eq!(error.status, Some(401));
    assert!(error.message.contains("Incorrect API key provided"));
}

#[tokio::test]
async fn test_rate_limit_message_is_rewritten() {
    let mock = MockProvider {
        chat: ChatBehavior::Fail {
            status: 429,
            body: r#"{"error":{"message":"Rate limit reached for gpt-4o. Please try again in 1.5s.","type":"requests"}}"#.to_owned(),
        },
        ..MockProvider::default()
    };
    let client = openai_client(&mock.clone().spawn().await);
    let request = hello_request().with_model("gpt-4o");

    let error = client.create_completion(&request, None, None).await.unwrap_err();

    assert_eq!(error.code, ErrorCode::ExternalRateLimited);
    assert!(error.message.contains("try again in 2 seconds"), "{}", error.message);
}

#[tokio::test]
async fn test_non_json_gateway_error_from_ollama_hints_at_server() {
    let mock = MockProvider {
        chat: ChatBehavior::Fail {
            status: 502,
            body: "<html>Bad Gateway</html>".to_owned(),
        },
        ..MockProvider::default()
    };
    let client = ollama_client(&mock.clone().spawn().await);
    let request = hello_request().with_model("llama3.2");

    let error = client.create_completion(&request, None, None).await.unwrap_err();

    assert_eq!(error.status, Some(502));
    assert!(error.message.contains("Is Ollama running?"), "{}", error.message);
}

// =============================================================================
// Streaming completions
// =============================================================================

#[tokio::test]
async fn test_streaming_delivers_every_fragment_in_order() {
    let first = delta_event("Hel");
    let second = delta_event("lo");
    // Second event is split across two reads
    let (head, tail) = second.split_at(second.len() / 2);
    let mock = MockProvider {
        stream_reads: vec![
            first,
            head.to_owned(),
            format!("{tail}{}", delta_event(" world")),
            "data: [DONE]\n\n".to_owned(),
        ],
        ..MockProvider::default()
    };
    let client = ollama_client(&mock.clone().spawn().await);
    let request = hello_request().with_model("llama3.2").with_streaming();

    let mut text = String::new();
    let mut batch_sizes = Vec::new();
    let mut on_batch = |batch: Vec<ChatCompletionChunk>| {
        batch_sizes.push(batch.len());
        for fragment in &batch {
            text.push_str(fragment.delta_content().unwrap_or_default());
        }
    };
    let outcome = client
        .create_completion(&request, Some(&mut on_batch), None)
        .await
        .unwrap();

    assert_eq!(text, "Hello world");
    assert!(batch_sizes.iter().all(|size| *size > 0));
    assert_eq!(batch_sizes.iter().sum::<usize>(), 3);
    match outcome {
        CompletionOutcome::Streamed {
            fragments,
            batches,
            skipped,
            terminated,
        } => {
            assert_eq!(fragments, 3);
            assert_eq!(batches, batch_sizes.len());
            assert_eq!(skipped, 0);
            assert!(terminated);
        }
        CompletionOutcome::Complete(_) => panic!("expected a streamed outcome"),
    }
    assert_eq!(mock.last_body()["stream"], true);
}

#[tokio::test]
async fn test_malformed_fragment_is_skipped() {
    let mock = MockProvider {
        stream_reads: vec![
            delta_event("a"),
            "data: {not json\n\n".to_owned(),
            delta_event("b"),
            "data: [DONE]\n\n".to_owned(),
        ],
        ..MockProvider::default()
    };
    let client = ollama_client(&mock.clone().spawn().await);
    let request = hello_request().with_model("llama3.2").with_streaming();

    let mut text = String::new();
    let mut on_batch = |batch: Vec<ChatCompletionChunk>| {
        for fragment in &batch {
            text.push_str(fragment.delta_content().unwrap_or_default());
        }
    };
    let outcome = client
        .create_completion(&request, Some(&mut on_batch), None)
        .await
        .unwrap();

    assert_eq!(text, "ab");
    assert!(matches!(
        outcome,
        CompletionOutcome::Streamed {
            fragments: 2,
            skipped: 1,
            terminated: true,
            ..
        }
    ));
}

#[tokio::test]
async fn test_stream_without_terminator_still_completes() {
    let mock = MockProvider {
        stream_reads: vec![delta_event("only")],
        ..MockProvider::default()
    };
    let client = ollama_client(&mock.clone().spawn().await);
    let request = hello_request().with_model("llama3.2").with_streaming();

    let outcome = client.create_completion(&request, None, None).await.unwrap();

    assert!(matches!(
        outcome,
        CompletionOutcome::Streamed {
            fragments: 1,
            terminated: false,
            ..
        }
    ));
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test]
async fn test_cancel_while_waiting_for_response() {
    let mock = MockProvider {
        chat: ChatBehavior::Hang(Duration::from_secs(30)),
        ..MockProvider::default()
    };
    let client = ollama_client(&mock.clone().spawn().await);
    let request = hello_request().with_model("llama3.2");
    let token = CancellationToken::new();

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });
    let error = tokio::time::timeout(
        Duration::from_secs(5),
        client.create_completion(&request, None, Some(&token)),
    )
    .await
    .expect("cancellation should end the call promptly")
    .unwrap_err();

    assert_eq!(error.category(), ErrorCategory::Cancelled);
}

#[tokio::test]
async fn test_cancel_from_listener_stops_stream() {
    let mock = MockProvider {
        stream_reads: vec![
            delta_event("first"),
            delta_event("second"),
            delta_event("third"),
            "data: [DONE]\n\n".to_owned(),
        ],
        read_delay: Duration::from_millis(200),
        ..MockProvider::default()
    };
    let client = ollama_client(&mock.clone().spawn().await);
    let request = hello_request().with_model("llama3.2").with_streaming();
    let token = CancellationToken::new();

    let listener_token = token.clone();
    let mut received = Vec::new();
    let mut on_batch = |batch: Vec<ChatCompletionChunk>| {
        received.extend(batch);
        listener_token.cancel();
    };
    let error = client
        .create_completion(&request, Some(&mut on_batch), Some(&token))
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::OperationCancelled);
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].delta_content(), Some("first"));
}

// =============================================================================
// Image generation
// =============================================================================

#[tokio::test]
async fn test_image_generation_unsupported_on_self_hosted() {
    let mock = MockProvider::default();
    let client = ollama_client(&mock.clone().spawn().await);

    let error = client
        .generate_image(&GenerateImageRequest::new("a cat"))
        .await
        .unwrap_err();

    assert_eq!(error.category(), ErrorCategory::Capability);
    assert_eq!(mock.hits(), 0);
    assert_eq!(client.provider(), LlmProvider::Ollama);
}

#[tokio::test]
async fn test_image_generation_on_cloud() {
    let mock = MockProvider::default();
    let client = openai_client(&mock.clone().spawn().await);
    let request = GenerateImageRequest::new("a cat")
        .with_model("dall-e-3")
        .with_size(ImageSize::Size1024);

    let response = client.generate_image(&request).await.unwrap();

    assert_eq!(response.data.len(), 1);
    assert_eq!(
        response.data[0].url.as_deref(),
        Some("https://images.example/cat.png")
    );
    assert_eq!(mock.last_body()["prompt"], "a cat");
    assert_eq!(mock.last_body()["size"], "1024x1024");
}
