// ABOUTME: Shared test utilities for integration tests
// ABOUTME: Provides an axum mock of the OpenAI-compatible HTTP surface and cache fixtures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `llm_chat_core`

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use futures_util::{stream, StreamExt};
use llm_chat_core::config::CacheConfig;
use llm_chat_core::database::MessageCache;
use serde_json::{json, Value};

/// How the mock answers `POST /v1/chat/completions`
#[derive(Clone, Debug)]
pub enum ChatBehavior {
    /// JSON completion, or the scripted stream when the request asks for one
    Normal,
    /// Non-2xx status with the given body
    Fail { status: u16, body: String },
    /// Sleep before answering
    Hang(Duration),
}

/// Scripted mock provider
#[derive(Clone)]
pub struct MockProvider {
    pub hits: Arc<AtomicUsize>,
    pub last_body: Arc<Mutex<Option<Value>>>,
    pub last_headers: Arc<Mutex<Option<HeaderMap>>>,
    pub models: Vec<&'static str>,
    pub stream_reads: Vec<String>,
    pub read_delay: Duration,
    pub chat: ChatBehavior,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            hits: Arc::new(AtomicUsize::new(0)),
            last_body: Arc::new(Mutex::new(None)),
            last_headers: Arc::new(Mutex::new(None)),
            models: vec!["llama3.2", "qwen2.5:7b"],
            stream_reads: Vec::new(),
            read_delay: Duration::from_millis(20),
            chat: ChatBehavior::Normal,
        }
    }
}

impl MockProvider {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn last_body(&self) -> Value {
        self.last_body
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .expect("no request body recorded")
    }

    pub fn last_header(&self, name: &str) -> Option<String> {
        self.last_headers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(|headers| headers.get(name))
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    }

    fn record(&self, headers: HeaderMap, body: Option<Value>) {
        self.hits.fetch_add(1, Ordering::SeqCst);
        *self
            .last_headers
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(headers);
        if body.is_some() {
            *self.last_body.lock().unwrap_or_else(PoisonError::into_inner) = body;
        }
    }

    /// Serve on an ephemeral port, returning the base URL
    pub async fn spawn(self) -> String {
        let router = Router::new()
            .route("/v1/models", get(list_models))
            .route("/v1/chat/completions", post(chat_completions))
            .route("/v1/images/generations", post(generate_image))
            .with_state(self);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{address}")
    }
}

/// One `data:` line carrying a content delta
pub fn delta_event(content: &str) -> String {
    let chunk = json!({
        "id": "chatcmpl-mock",
        "object": "chat.completion.chunk",
        "created": 1_700_000_000,
        "model": "llama3.2",
        "choices": [{"index": 0, "delta": {"content": content}, "finish_reason": null}]
    });
    format!("data: {chunk}\n\n")
}

/// Base URL of a port nothing listens on
pub async fn unreachable_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{address}")
}

/// Fresh, initialized in-memory cache
pub async fn memory_cache() -> MessageCache {
    let cache = MessageCache::connect(&CacheConfig::in_memory())
        .await
        .expect("Failed to open in-memory cache");
    cache.initialize().await.expect("Failed to create schema");
    cache
}

async fn list_models(State(mock): State<MockProvider>, headers: HeaderMap) -> Json<Value> {
    mock.record(headers, None);
    let data: Vec<Value> = mock
        .models
        .iter()
        .map(|id| json!({"id": id, "object": "model", "created": 1_700_000_000, "owned_by": "library"}))
        .collect();
    Json(json!({"object": "list", "data": data}))
}

async fn chat_completions(
    State(mock): State<MockProvider>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let streaming = body.get("stream").and_then(Value::as_bool).unwrap_or(false);
    let model = body.get("model").cloned().unwrap_or(Value::Null);
    mock.record(headers, Some(body));

    match mock.chat.clone() {
        ChatBehavior::Fail { status, body } => {
            let status = StatusCode::from_u16(status).unwrap();
            (status, body).into_response()
        }
        ChatBehavior::Hang(delay) => {
            tokio::time::sleep(delay).await;
            StatusCode::NO_CONTENT.into_response()
        }
        ChatBehavior::Normal if streaming => {
            let delay = mock.read_delay;
            let reads = stream::iter(mock.stream_reads).then(move |read| async move {
                tokio::time::sleep(delay).await;
                Ok::<_, Infallible>(Bytes::from(read))
            });
            (
                [(header::CONTENT_TYPE, "text/event-stream")],
                Body::from_stream(reads),
            )
                .into_response()
        }
        ChatBehavior::Normal => Json(json!({
            "id": "chatcmpl-mock",
            "object": "chat.completion",
            "created": 1_700_000_000,
            "model": model,
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hello from the mock"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 5, "completion_tokens": 4, "total_tokens": 9}
        }))
        .into_response(),
    }
}

async fn generate_image(
    State(mock): State<MockProvider>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    mock.record(headers, Some(body));
    Json(json!({
        "created": 1_700_000_000,
        "data": [{"url": "https://images.example/cat.png", "revised_prompt": "a cat"}]
    }))
}
