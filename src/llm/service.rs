// ABOUTME: Owned LLM service façade validating configuration and model selection
// ABOUTME: Builds a provider client, checks it has models, and delegates completions to it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # LLM Service
//!
//! An explicit, caller-owned entry point. Several services with different
//! configurations can coexist; nothing here is global.

use tracing::{info, instrument};

use super::{CompletionOutcome, FragmentListener, LlmClient, OpenAiCompatibleClient};
use crate::cancellation::CancellationToken;
use crate::config::{HttpClientConfig, LlmConfiguration, LlmProvider};
use crate::errors::{AppError, AppResult};
use crate::models::{ChatRequest, GenerateImageRequest, ImageResponse, Model, ModelList};

/// Caller-owned façade over one provider client
pub struct LlmService {
    client: Box<dyn LlmClient>,
}

impl LlmService {
    /// Every provider a service can be connected to
    #[must_use]
    pub const fn providers() -> &'static [LlmProvider] {
        LlmProvider::all()
    }

    /// Validate `config`, build a client, and confirm the provider serves at least one model
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` is invalid or the provider
    /// lists no models, or the listing call's own error.
    pub async fn connect(config: LlmConfiguration) -> AppResult<Self> {
        Self::connect_with(config, HttpClientConfig::default()).await
    }

    /// Like [`Self::connect`] with explicit HTTP timeouts
    ///
    /// # Errors
    ///
    /// Same as [`Self::connect`].
    pub async fn connect_with(config: LlmConfiguration, http: HttpClientConfig) -> AppResult<Self> {
        let client = OpenAiCompatibleClient::with_http_config(config, http)?;
        Self::from_client(Box::new(client)).await
    }

    /// Wrap an existing client, fetching its model list
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the provider lists no models, or the
    /// listing call's own error.
    pub async fn from_client(client: Box<dyn LlmClient>) -> AppResult<Self> {
        let models = client.list_models().await?;
        if models.data.is_empty() {
            return Err(AppError::config(format!(
                "No models found for provider {}",
                client.provider()
            )));
        }
        info!(
            provider = %client.provider(),
            models = models.data.len(),
            "LLM service connected"
        );
        Ok(Self { client })
    }

    /// Underlying client
    #[must_use]
    pub fn client(&self) -> &dyn LlmClient {
        self.client.as_ref()
    }

    /// Provider of the underlying client
    #[must_use]
    pub fn provider(&self) -> LlmProvider {
        self.client.provider()
    }

    /// Fetch a fresh model listing
    ///
    /// # Errors
    ///
    /// Returns the listing call's error.
    pub async fn models(&self) -> AppResult<ModelList> {
        self.client.list_models().await
    }

    /// Last fetched listing without a network call
    #[must_use]
    pub fn cached_models(&self) -> Option<ModelList> {
        self.client.cached_models()
    }

    /// Currently selected model
    #[must_use]
    pub fn active_model(&self) -> Option<Model> {
        self.client.active_model()
    }

    /// Select a model by id after checking it against the listing
    ///
    /// Uses the cached listing, fetching one first if none exists.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if no listed model has this id.
    #[instrument(skip(self), fields(provider = %self.provider()))]
    pub async fn select_model(&self, id: &str) -> AppResult<Model> {
        let listing = match self.client.cached_models() {
            Some(listing) => listing,
            None => self.client.list_models().await?,
        };
        let model = listing
            .find(id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Model {id}")))?;

        self.client.set_active_model(model.clone());
        info!(model = %model.id, "Model selected");
        Ok(model)
    }

    /// Run a chat completion
    ///
    /// # Errors
    ///
    /// See [`LlmClient::create_completion`].
    pub async fn complete(
        &self,
        request: &ChatRequest,
        listener: Option<FragmentListener<'_>>,
        cancel: Option<&CancellationToken>,
    ) -> AppResult<CompletionOutcome> {
        self.client.create_completion(request, listener, cancel).await
    }

    /// Generate images from a prompt
    ///
    /// # Errors
    ///
    /// See [`LlmClient::generate_image`].
    pub async fn generate_image(&self, request: &GenerateImageRequest) -> AppResult<ImageResponse> {
        self.client.generate_image(request).await
    }
}
