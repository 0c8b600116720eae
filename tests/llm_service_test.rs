// ABOUTME: Integration tests for the LLM service façade
// ABOUTME: Validates connection checks, model selection against the listing, and delegation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::MockProvider;
use llm_chat_core::config::{LlmConfiguration, LlmProvider};
use llm_chat_core::errors::{ErrorCategory, ErrorCode};
use llm_chat_core::llm::LlmService;
use llm_chat_core::models::{ChatMessage, ChatRequest, GenerateImageRequest};

async fn connected_service(mock: &MockProvider) -> LlmService {
    let base_url = mock.clone().spawn().await;
    LlmService::connect(LlmConfiguration::self_hosted(Some(&base_url)))
        .await
        .unwrap()
}

#[test]
fn test_providers_lists_both() {
    assert_eq!(
        LlmService::providers(),
        &[LlmProvider::Ollama, LlmProvider::OpenAi]
    );
}

#[tokio::test]
async fn test_connect_fetches_model_listing() {
    let mock = MockProvider::default();
    let service = connected_service(&mock).await;

    assert_eq!(service.provider(), LlmProvider::Ollama);
    assert_eq!(service.cached_models().unwrap().data.len(), 2);
    assert!(service.active_model().is_none());
    assert_eq!(mock.hits(), 1);
}

#[tokio::test]
async fn test_connect_rejects_provider_without_models() {
    let mock = MockProvider {
        models: Vec::new(),
        ..MockProvider::default()
    };
    let base_url = mock.clone().spawn().await;

    let error = LlmService::connect(LlmConfiguration::self_hosted(Some(&base_url)))
        .await
        .err()
        .unwrap();

    assert_eq!(error.category(), ErrorCategory::Configuration);
    assert!(error.message.contains("No models found"));
}

#[tokio::test]
async fn test_connect_rejects_invalid_configuration_without_network() {
    let config = LlmConfiguration::self_hosted(Some("ftp://localhost:11434"));

    let error = LlmService::connect(config).await.err().unwrap();

    assert_eq!(error.category(), ErrorCategory::Configuration);
}

#[tokio::test]
async fn test_select_model_uses_cached_listing() {
    let mock = MockProvider::default();
    let service = connected_service(&mock).await;

    let model = service.select_model("qwen2.5:7b").await.unwrap();

    assert_eq!(model.id, "qwen2.5:7b");
    assert_eq!(service.active_model(), Some(model));
    // Only the listing made during connect
    assert_eq!(mock.hits(), 1);
}

#[tokio::test]
async fn test_select_unknown_model_is_not_found() {
    let mock = MockProvider::default();
    let service = connected_service(&mock).await;

    let error = service.select_model("gpt-5").await.unwrap_err();

    assert_eq!(error.code, ErrorCode::ResourceNotFound);
    assert!(service.active_model().is_none());
}

#[tokio::test]
async fn test_complete_with_selected_model() {
    let mock = MockProvider::default();
    let service = connected_service(&mock).await;
    service.select_model("llama3.2").await.unwrap();

    let request = ChatRequest::new(vec![
        ChatMessage::system("Be brief."),
        ChatMessage::user("Hi"),
    ]);
    let outcome = service.complete(&request, None, None).await.unwrap();

    assert_eq!(
        outcome.completion().and_then(|c| c.first_content()),
        Some("Hello from the mock")
    );
    assert_eq!(mock.last_body()["model"], "llama3.2");
    assert_eq!(mock.last_body()["messages"][0]["role"], "system");
}

#[tokio::test]
async fn test_generate_image_delegates_capability_check() {
    let mock = MockProvider::default();
    let service = connected_service(&mock).await;

    let error = service
        .generate_image(&GenerateImageRequest::new("a lighthouse"))
        .await
        .unwrap_err();

    assert_eq!(error.code, ErrorCode::UnsupportedOperation);
    assert_eq!(mock.hits(), 1);
}
