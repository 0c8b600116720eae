// ABOUTME: LLM client abstraction for OpenAI-compatible providers with streaming support
// ABOUTME: Defines the client contract, completion outcomes, and the fragment listener type
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # LLM Client Interface
//!
//! [`LlmClient`] is the contract every provider client implements. The only
//! implementation shipped here is [`OpenAiCompatibleClient`], which talks to
//! both a self-hosted Ollama server and the `OpenAI` cloud.
//!
//! ## Key Concepts
//!
//! - **Provider**: fixed at construction, see [`LlmProvider`]
//! - **Cached model list**: `None` until the first successful listing, then
//!   replaced wholesale by each listing call
//! - **Active model**: used when a request does not name a model
//! - **Fragment listener**: receives one batch of decoded fragments per
//!   network read during a streaming completion
//!
//! ## Example: Streaming a Completion
//!
//! ```rust,no_run
//! use llm_chat_core::config::LlmConfiguration;
//! use llm_chat_core::llm::{LlmClient, OpenAiCompatibleClient};
//! use llm_chat_core::models::{ChatMessage, ChatRequest, Model};
//!
//! # async fn example() -> llm_chat_core::errors::AppResult<()> {
//! let client = OpenAiCompatibleClient::new(LlmConfiguration::self_hosted(None))?;
//! client.set_active_model(Model::from_id("llama3.2"));
//!
//! let request = ChatRequest::new(vec![ChatMessage::user("Tell me a joke")]).with_streaming();
//! let mut text = String::new();
//! let mut on_batch = |batch: Vec<llm_chat_core::models::ChatCompletionChunk>| {
//!     for fragment in &batch {
//!         text.push_str(fragment.delta_content().unwrap_or_default());
//!     }
//! };
//! client.create_completion(&request, Some(&mut on_batch), None).await?;
//! # Ok(())
//! # }
//! ```

mod openai_compatible;
/// Owned façade validating configuration and model selection
pub mod service;
/// Incremental Server-Sent Events decoding
pub mod sse_parser;

pub use openai_compatible::OpenAiCompatibleClient;
pub use service::LlmService;
pub use sse_parser::{decode_chunk, ServerSentEvent, SseDecoder};

use async_trait::async_trait;

use crate::cancellation::CancellationToken;
use crate::config::LlmProvider;
use crate::errors::AppResult;
use crate::models::{
    ChatCompletion, ChatCompletionChunk, ChatRequest, GenerateImageRequest, ImageResponse, Model,
    ModelList,
};

/// Callback invoked once per network read with every fragment decoded from it
pub type FragmentListener<'a> = &'a mut (dyn FnMut(Vec<ChatCompletionChunk>) + Send);

/// Result of a chat-completion call
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// Full response of a non-streaming call
    Complete(ChatCompletion),
    /// Placeholder for a streaming call; the content went to the listener
    Streamed {
        /// Fragments decoded and delivered
        fragments: usize,
        /// Listener invocations (reads that produced at least one fragment)
        batches: usize,
        /// Malformed fragments skipped
        skipped: usize,
        /// Whether the `[DONE]` terminator was seen before end of stream
        terminated: bool,
    },
}

impl CompletionOutcome {
    /// The full response, for non-streaming calls
    #[must_use]
    pub const fn completion(&self) -> Option<&ChatCompletion> {
        match self {
            Self::Complete(completion) => Some(completion),
            Self::Streamed { .. } => None,
        }
    }

    /// Consume the outcome, returning the full response for non-streaming calls
    #[must_use]
    pub fn into_completion(self) -> Option<ChatCompletion> {
        match self {
            Self::Complete(completion) => Some(completion),
            Self::Streamed { .. } => None,
        }
    }
}

/// Contract for `OpenAI`-compatible provider clients
///
/// Methods take `&self`; session state (cached listing, active model) lives
/// behind interior mutability with last-write-wins semantics.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider this client was built for
    fn provider(&self) -> LlmProvider;

    /// Last full model listing, or `None` if never fetched
    fn cached_models(&self) -> Option<ModelList>;

    /// Fetch `GET {base}/v1/models`, replacing the cached listing
    async fn list_models(&self) -> AppResult<ModelList>;

    /// Currently selected model, if any
    fn active_model(&self) -> Option<Model>;

    /// Select a model without checking it against the listing
    fn set_active_model(&self, model: Model);

    /// Run a chat completion, streaming fragments to `listener` when `request.stream` is set
    async fn create_completion(
        &self,
        request: &ChatRequest,
        listener: Option<FragmentListener<'_>>,
        cancel: Option<&CancellationToken>,
    ) -> AppResult<CompletionOutcome>;

    /// Generate images from a prompt
    async fn generate_image(&self, request: &GenerateImageRequest) -> AppResult<ImageResponse>;
}
