// ABOUTME: Main library entry point for the OpenAI-compatible LLM client and conversation cache
// ABOUTME: Exposes provider clients, SSE decoding, and the transactional SQLite chat store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # LLM Chat Core
//!
//! A provider-agnostic client for `OpenAI`-compatible LLM HTTP APIs (a self-hosted
//! Ollama-style server or the `OpenAI` cloud) paired with a local `SQLite` store
//! for conversation history.
//!
//! ## Architecture
//!
//! - **LLM client**: resolves the target model, issues chat-completion and
//!   image-generation requests, and decodes streamed completions from
//!   Server-Sent Events without losing data across network reads
//! - **Conversation cache**: keeps `chats` and `messages` consistent with
//!   explicit transactions around every multi-statement mutation
//! - **Service**: an owned façade that validates configuration and the
//!   selected model before delegating to the client
//!
//! The client and the cache are siblings; neither calls the other.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use llm_chat_core::config::{CacheConfig, LlmConfiguration};
//! use llm_chat_core::database::MessageCache;
//! use llm_chat_core::errors::AppResult;
//! use llm_chat_core::llm::LlmService;
//! use llm_chat_core::models::{ChatMessage, ChatRequest, Role};
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let service = LlmService::connect(LlmConfiguration::self_hosted(None)).await?;
//!     service.select_model("llama3.2").await?;
//!
//!     let cache = MessageCache::connect(&CacheConfig::in_memory()).await?;
//!     cache.initialize().await?;
//!     let chat = cache.add_chat("demo", None).await?;
//!
//!     let request = ChatRequest::new(vec![ChatMessage::user("Hello!")]);
//!     let outcome = service.complete(&request, None, None).await?;
//!     if let Some(content) = outcome.completion().and_then(|c| c.first_content()) {
//!         cache
//!             .add_message(chat.last_insert_row_id, content, Role::Assistant, None, None)
//!             .await?;
//!     }
//!     Ok(())
//! }
//! ```

/// Cooperative cancellation for long-running streaming calls
pub mod cancellation;

/// Provider, HTTP, and store configuration
pub mod config;

/// Transactional conversation cache backed by `SQLite`
pub mod database;

/// Unified error handling with categorised error codes
pub mod errors;

/// LLM provider clients, SSE decoding, and the service façade
pub mod llm;

/// Structured logging setup
pub mod logging;

/// Wire types for the `OpenAI`-compatible HTTP surface
pub mod models;
