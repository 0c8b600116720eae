// ABOUTME: OpenAI-compatible HTTP client for self-hosted Ollama servers and the OpenAI cloud
// ABOUTME: Lists models, runs streaming and non-streaming completions, and generates images
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # `OpenAI`-Compatible Client
//!
//! One implementation serves both providers; they differ only in base URL,
//! credential, and the image-generation capability.
//!
//! ## Endpoints
//!
//! - `GET {base}/v1/models`
//! - `POST {base}/v1/chat/completions` (JSON or `text/event-stream`)
//! - `POST {base}/v1/images/generations` (cloud only)
//!
//! ## Streaming
//!
//! The response body is read one network chunk at a time. Each chunk is fed
//! to an [`SseDecoder`], every non-terminator event is parsed as a
//! [`ChatCompletionChunk`], and the listener is called once with the batch
//! decoded from that chunk. Fragments that fail to parse are logged and
//! skipped; the stream keeps going.

use std::future::Future;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use super::sse_parser::{ServerSentEvent, SseDecoder};
use super::{CompletionOutcome, FragmentListener, LlmClient};
use crate::cancellation::CancellationToken;
use crate::config::{HttpClientConfig, LlmConfiguration, LlmProvider};
use crate::errors::{AppError, AppResult};
use crate::models::{
    ChatCompletionChunk, ChatRequest, GenerateImageRequest, ImageResponse, Model, ModelList,
    ProviderErrorBody,
};

/// Longest excerpt of a non-JSON error body carried into an error message
const ERROR_BODY_EXCERPT_CHARS: usize = 200;

/// Running totals for one streaming call
#[derive(Debug, Default)]
struct StreamTally {
    fragments: usize,
    batches: usize,
    skipped: usize,
    terminated: bool,
}

impl From<StreamTally> for CompletionOutcome {
    fn from(tally: StreamTally) -> Self {
        Self::Streamed {
            fragments: tally.fragments,
            batches: tally.batches,
            skipped: tally.skipped,
            terminated: tally.terminated,
        }
    }
}

/// Client for any endpoint implementing the `OpenAI` REST surface
pub struct OpenAiCompatibleClient {
    http: Client,
    config: LlmConfiguration,
    cached_models: RwLock<Option<ModelList>>,
    active_model: RwLock<Option<Model>>,
}

impl OpenAiCompatibleClient {
    /// Create a client with default HTTP timeouts
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` is invalid, or an internal
    /// error if the HTTP client cannot be created.
    pub fn new(config: LlmConfiguration) -> AppResult<Self> {
        Self::with_http_config(config, HttpClientConfig::default())
    }

    /// Create a client with explicit HTTP timeouts
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` is invalid, or an internal
    /// error if the HTTP client cannot be created.
    pub fn with_http_config(config: LlmConfiguration, http: HttpClientConfig) -> AppResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .connect_timeout(http.connect_timeout)
            .timeout(http.request_timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        info!(
            provider = %config.provider(),
            base_url = %config.base_url(),
            "Initialized {} client",
            config.provider().display_name()
        );

        Ok(Self {
            http: client,
            config,
            cached_models: RwLock::new(None),
            active_model: RwLock::new(None),
        })
    }

    /// Configuration this client was built from
    #[must_use]
    pub const fn configuration(&self) -> &LlmConfiguration {
        &self.config
    }

    /// Build the API URL for a given endpoint
    fn api_url(&self, endpoint: &str) -> String {
        format!("{}/v1/{endpoint}", self.config.base_url())
    }

    fn service_name(&self) -> &'static str {
        self.config.provider().display_name()
    }

    /// Add bearer and organization headers when configured
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match self.config.api_key() {
            Some(api_key) => request.bearer_auth(api_key),
            None => request,
        };
        match self.config.organization() {
            Some(organization) => request.header("OpenAI-Organization", organization),
            None => request,
        }
    }

    /// Send a request, mapping network failures and non-2xx statuses to errors
    async fn send(&self, request: RequestBuilder) -> AppResult<Response> {
        let response = self.authorize(request).send().await.map_err(|e| {
            warn!(provider = %self.config.provider(), error = %e, "Request to provider failed");
            let message = if e.is_connect() {
                format!(
                    "Cannot connect to {}. Is the server running at {}?",
                    self.service_name(),
                    self.config.base_url()
                )
            } else if e.is_timeout() {
                "Request timed out".to_owned()
            } else {
                format!("Request failed: {e}")
            };
            AppError::transport(self.service_name(), message).with_source(e)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // The status already decides the outcome; an unreadable body only loses detail
        let body = response.text().await.unwrap_or_default();
        Err(self.parse_error_response(status, &body))
    }

    /// Parse error response from API
    fn parse_error_response(&self, status: StatusCode, body: &str) -> AppError {
        let service = self.service_name();
        let code = status.as_u16();
        let error = match serde_json::from_str::<ProviderErrorBody>(body) {
            Ok(parsed) if code == 429 => AppError::provider(
                service,
                code,
                extract_rate_limit_message(&parsed.error.message),
            ),
            Ok(parsed) => AppError::provider(service, code, parsed.error.message),
            Err(_) if matches!(code, 502..=504) && self.config.provider() == LlmProvider::Ollama => {
                AppError::provider(
                    service,
                    code,
                    format!(
                        "Server at {} is not responding. Is Ollama running?",
                        self.config.base_url()
                    ),
                )
            }
            Err(_) => AppError::provider(
                service,
                code,
                body.chars().take(ERROR_BODY_EXCERPT_CHARS).collect::<String>(),
            ),
        };
        warn!(status = code, error = %error, "Provider returned an error response");
        error
    }

    /// Read a success body as JSON
    async fn read_json<T: DeserializeOwned>(response: Response, what: &str) -> AppResult<T> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            debug!(
                body_preview = %body.chars().take(ERROR_BODY_EXCERPT_CHARS).collect::<String>(),
                "Unparseable {what} response"
            );
            AppError::decode(format!("Failed to parse {what} response: {e}")).with_source(e)
        })
    }

    /// Request model, else active model, else fail
    fn resolve_model(&self, requested: Option<&str>) -> AppResult<String> {
        if let Some(model) = requested.map(str::trim).filter(|m| !m.is_empty()) {
            return Ok(model.to_owned());
        }
        self.active_model
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|model| model.id.clone())
            .ok_or_else(|| {
                AppError::invalid_input(
                    "Model not set: name a model in the request or select an active model",
                )
            })
    }

    /// Read the event stream to exhaustion, delivering one batch per read
    async fn consume_stream(
        response: Response,
        mut listener: Option<FragmentListener<'_>>,
        cancel: Option<&CancellationToken>,
    ) -> AppResult<StreamTally> {
        let mut body = Box::pin(response.bytes_stream());
        let mut decoder = SseDecoder::new();
        let mut tally = StreamTally::default();

        loop {
            match until_cancelled(cancel, "Streaming chat completion", body.next()).await? {
                Some(Ok(bytes)) => {
                    let events = decoder.feed(&bytes)?;
                    dispatch(events, &mut listener, &mut tally);
                }
                Some(Err(e)) => {
                    return Err(AppError::transport(
                        "HTTP",
                        format!("Stream interrupted after {} fragments: {e}", tally.fragments),
                    )
                    .with_source(e));
                }
                None => break,
            }
        }

        dispatch(decoder.finish().into_iter().collect(), &mut listener, &mut tally);
        debug!(
            fragments = tally.fragments,
            batches = tally.batches,
            skipped = tally.skipped,
            terminated = tally.terminated,
            "Completion stream exhausted"
        );
        Ok(tally)
    }
}

/// Parse one read's events and hand the resulting batch to the listener
fn dispatch(
    events: Vec<ServerSentEvent>,
    listener: &mut Option<FragmentListener<'_>>,
    tally: &mut StreamTally,
) {
    let mut batch = Vec::with_capacity(events.len());
    for event in events {
        if event.finished {
            tally.terminated = true;
            continue;
        }
        match serde_json::from_str::<ChatCompletionChunk>(&event.data) {
            Ok(fragment) => batch.push(fragment),
            Err(e) => {
                tally.skipped += 1;
                warn!(
                    error = %e,
                    payload_len = event.data.len(),
                    "Skipping malformed completion fragment"
                );
            }
        }
    }

    if batch.is_empty() {
        return;
    }
    tally.fragments += batch.len();
    tally.batches += 1;
    if let Some(listener) = listener.as_deref_mut() {
        listener(batch);
    }
}

/// Race `future` against the token, failing with a cancellation error if it fires first
async fn until_cancelled<F>(
    cancel: Option<&CancellationToken>,
    operation: &str,
    future: F,
) -> AppResult<F::Output>
where
    F: Future + Send,
    F::Output: Send,
{
    match cancel {
        Some(token) => tokio::select! {
            biased;
            () = token.cancelled() => {
                info!(operation, "Operation cancelled by caller");
                Err(AppError::cancelled(operation))
            }
            output = future => Ok(output),
        },
        None => Ok(future.await),
    }
}

/// Extract a user-friendly rate limit message from an `OpenAI`-style error
fn extract_rate_limit_message(message: &str) -> String {
    const PREFIX: &str = "try again in ";
    if let Some(retry_pos) = message.to_lowercase().find(PREFIX) {
        let after_prefix = message.get(retry_pos + PREFIX.len()..).unwrap_or_default();
        let end_pos = after_prefix
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(after_prefix.len());
        if let Ok(seconds) = after_prefix[..end_pos].parse::<f64>() {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let seconds_int = seconds.ceil() as u64;
            return format!("LLM rate limit reached. Please try again in {seconds_int} seconds.");
        }
    }
    "LLM rate limit reached. Please wait a moment and try again.".to_owned()
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    fn provider(&self) -> LlmProvider {
        self.config.provider()
    }

    fn cached_models(&self) -> Option<ModelList> {
        self.cached_models
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[instrument(skip(self), fields(provider = %self.config.provider()))]
    async fn list_models(&self) -> AppResult<ModelList> {
        let response = self.send(self.http.get(self.api_url("models"))).await?;
        let models: ModelList = Self::read_json(response, "model list").await?;
        debug!(count = models.data.len(), "Fetched model list");

        *self
            .cached_models
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(models.clone());
        Ok(models)
    }

    fn active_model(&self) -> Option<Model> {
        self.active_model
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_active_model(&self, model: Model) {
        debug!(model = %model.id, "Active model set");
        *self
            .active_model
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(model);
    }

    #[instrument(
        skip(self, request, listener, cancel),
        fields(provider = %self.config.provider(), stream = request.is_streaming())
    )]
    async fn create_completion(
        &self,
        request: &ChatRequest,
        listener: Option<FragmentListener<'_>>,
        cancel: Option<&CancellationToken>,
    ) -> AppResult<CompletionOutcome> {
        let model = self.resolve_model(request.model.as_deref())?;
        let body = ChatRequest {
            model: Some(model),
            ..request.clone()
        };
        debug!(
            model = body.model.as_deref().unwrap_or_default(),
            messages = body.messages.len(),
            "Sending chat completion request"
        );

        let http_request = self.http.post(self.api_url("chat/completions")).json(&body);
        let response = until_cancelled(cancel, "Chat completion", self.send(http_request)).await??;

        if body.is_streaming() {
            let tally = Self::consume_stream(response, listener, cancel).await?;
            return Ok(tally.into());
        }

        let completion = until_cancelled(
            cancel,
            "Chat completion",
            Self::read_json(response, "chat completion"),
        )
        .await??;
        Ok(CompletionOutcome::Complete(completion))
    }

    #[instrument(skip(self, request), fields(provider = %self.config.provider()))]
    async fn generate_image(&self, request: &GenerateImageRequest) -> AppResult<ImageResponse> {
        let provider = self.config.provider();
        if !provider.supports_image_generation() {
            return Err(AppError::unsupported(provider, "Image generation"));
        }

        let http_request = self
            .http
            .post(self.api_url("images/generations"))
            .json(request);
        let response = self.send(http_request).await?;
        Self::read_json(response, "image generation").await
    }
}
