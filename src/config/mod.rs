// ABOUTME: Configuration module for provider selection, HTTP client tuning, and the chat store
// ABOUTME: Resolves typed configuration from explicit values or environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration for the LLM client and the conversation cache
//!
//! - **LLM**: provider identity, base URL, credentials, HTTP timeouts
//! - **Database**: `SQLite` URL and pool sizing for the conversation cache

/// Conversation cache database configuration
pub mod database;
/// Provider identity and per-provider configuration variants
pub mod llm;

pub use database::{CacheConfig, DatabaseUrl};
pub use llm::{HttpClientConfig, LlmConfiguration, LlmProvider};

use std::env;

/// Read an environment variable, treating blank values as unset
pub(crate) fn env_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
