// ABOUTME: Chat-completion response types for full responses and streamed fragments
// ABOUTME: Lenient deserialization so self-hosted servers with sparse payloads still decode
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Token usage statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    /// Number of tokens in the prompt
    #[serde(default)]
    pub prompt_tokens: u32,
    /// Number of tokens in the completion
    #[serde(default)]
    pub completion_tokens: u32,
    /// Total tokens used
    #[serde(default)]
    pub total_tokens: u32,
    /// Provider-specific completion token breakdown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens_details: Option<Value>,
    /// Provider-specific prompt token breakdown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens_details: Option<Value>,
}

/// Function invocation requested by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Function name
    pub name: String,
    /// JSON-encoded arguments
    pub arguments: String,
}

/// Tool call emitted by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call identifier, echoed back in the tool message
    pub id: String,
    /// Tool type (currently always `function`)
    #[serde(rename = "type")]
    pub kind: String,
    /// Function invocation
    pub function: FunctionCall,
}

/// Assistant message inside a completion choice
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMessage {
    /// Author role (normally `assistant`)
    #[serde(default)]
    pub role: String,
    /// Generated text
    #[serde(default)]
    pub content: Option<String>,
    /// Refusal text, if the model refused
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refusal: Option<String>,
    /// Tool calls requested by the model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// URL citations and other annotations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Vec<Value>>,
}

/// One choice of a non-streaming completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// Choice index
    #[serde(default)]
    pub index: u32,
    /// Generated message
    pub message: ResponseMessage,
    /// Why generation stopped (`stop`, `length`, `tool_calls`, ...)
    #[serde(default)]
    pub finish_reason: Option<String>,
    /// Log probabilities, when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<Value>,
}

/// Non-streaming chat-completion response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletion {
    /// Completion identifier
    #[serde(default)]
    pub id: String,
    /// Object type (`chat.completion`)
    #[serde(default)]
    pub object: String,
    /// Creation time, unix seconds
    #[serde(default)]
    pub created: i64,
    /// Model that produced the completion
    #[serde(default)]
    pub model: String,
    /// Backend configuration fingerprint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_fingerprint: Option<String>,
    /// Generated choices
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Token usage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    /// Service tier that processed the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_tier: Option<String>,
}

impl ChatCompletion {
    /// Text of the first choice, if any
    #[must_use]
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }
}

/// Incremental message update inside a streamed fragment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    /// Author role, present on the first fragment only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Text appended by this fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Refusal text appended by this fragment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refusal: Option<String>,
    /// Partial tool calls (arguments arrive in pieces)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<Value>>,
}

/// One choice of a streamed fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkChoice {
    /// Choice index
    #[serde(default)]
    pub index: u32,
    /// Incremental update
    #[serde(default)]
    pub delta: Delta,
    /// Set on the last fragment of a choice
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// A streamed completion fragment (one decoded SSE `data:` payload)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    /// Completion identifier, shared by every fragment of a response
    #[serde(default)]
    pub id: String,
    /// Object type (`chat.completion.chunk`)
    #[serde(default)]
    pub object: String,
    /// Creation time, unix seconds
    #[serde(default)]
    pub created: i64,
    /// Model producing the stream
    #[serde(default)]
    pub model: String,
    /// Backend configuration fingerprint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_fingerprint: Option<String>,
    /// Choice updates
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    /// Token usage, on the final fragment when `include_usage` is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl ChatCompletionChunk {
    /// Text appended to the first choice by this fragment
    #[must_use]
    pub fn delta_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
    }

    /// Finish reason of the first choice, if this fragment ends it
    #[must_use]
    pub fn finish_reason(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.finish_reason.as_deref())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_sparse_chunk_decodes() {
        let chunk: ChatCompletionChunk = serde_json::from_str(
            r#"{"id":"chatcmpl-1","object":"chat.completion.chunk","created":1,"model":"llama3.2","choices":[{"index":0,"delta":{"content":"Hel"},"finish_reason":null}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.delta_content(), Some("Hel"));
        assert!(chunk.finish_reason().is_none());
    }

    #[test]
    fn test_completion_first_content() {
        let completion: ChatCompletion = serde_json::from_str(
            r#"{"id":"c","object":"chat.completion","created":2,"model":"gpt-4o","choices":[{"index":0,"message":{"role":"assistant","content":"Hi!"},"finish_reason":"stop"}],"usage":{"prompt_tokens":3,"completion_tokens":2,"total_tokens":5}}"#,
        )
        .unwrap();
        assert_eq!(completion.first_content(), Some("Hi!"));
        assert_eq!(completion.usage.unwrap().total_tokens, 5);
    }
}
