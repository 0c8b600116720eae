// ABOUTME: Wire types for the OpenAI-compatible HTTP surface
// ABOUTME: Re-exports request, response, model listing, image, and error body structures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Data Models
//!
//! Serde types matching the `OpenAI`-compatible REST API bit-exactly. Optional
//! fields are omitted from serialized requests when unset so self-hosted
//! servers that reject unknown keys keep working.
//!
//! - `ChatRequest` / `ChatMessage`: chat-completion request body
//! - `ChatCompletion`: non-streaming response
//! - `ChatCompletionChunk`: one streamed completion fragment
//! - `Model` / `ModelList`: `/v1/models` listing
//! - `GenerateImageRequest` / `ImageResponse`: image generation

mod chat;
mod completion;
mod image;
mod model;

pub use chat::{
    ChatMessage, ChatRequest, ContentPart, JsonSchemaFormat, MessageContent, ReasoningEffort,
    ResponseFormat, Role, StopSequence, StreamOptions,
};
pub use completion::{
    ChatCompletion, ChatCompletionChunk, Choice, ChunkChoice, Delta, FunctionCall,
    ResponseMessage, ToolCall, Usage,
};
pub use image::{
    GenerateImageRequest, Image, ImageBackground, ImageFormat, ImageModeration, ImageQuality,
    ImageResponse, ImageSize, ImageStyle,
};
pub use model::{Model, ModelList};

use serde::{Deserialize, Serialize};

/// Structured error body returned by providers on non-2xx responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderErrorBody {
    /// Error details
    pub error: ProviderErrorDetail,
}

/// The `error` object of a provider error body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderErrorDetail {
    /// Provider's human-readable message
    pub message: String,
    /// Error class, e.g. `invalid_request_error`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Offending parameter, if reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    /// Provider error code (string or number depending on provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<serde_json::Value>,
}
