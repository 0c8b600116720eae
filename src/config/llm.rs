// ABOUTME: Provider identity enum and tagged configuration union for OpenAI-compatible endpoints
// ABOUTME: Validates per-provider requirements (credential, base URL) by exhaustive matching
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::env_non_empty;
use crate::errors::{AppError, AppResult};

/// Environment variable selecting the provider (`ollama` or `openai`)
pub const PROVIDER_ENV: &str = "LLM_CHAT_PROVIDER";
/// Environment variable overriding the provider base URL
pub const BASE_URL_ENV: &str = "LLM_CHAT_BASE_URL";
/// Environment variable holding the provider API key
pub const API_KEY_ENV: &str = "LLM_CHAT_API_KEY";
/// Conventional `OpenAI` key variable, used when `LLM_CHAT_API_KEY` is unset
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Environment variable holding the `OpenAI` organization id
pub const ORGANIZATION_ENV: &str = "LLM_CHAT_ORGANIZATION";

/// Default address of a self-hosted Ollama server
pub const DEFAULT_SELF_HOSTED_BASE_URL: &str = "http://localhost:11434";
/// Base address of the `OpenAI` cloud API
pub const DEFAULT_CLOUD_BASE_URL: &str = "https://api.openai.com";

/// Connection timeout (local servers may be slow to accept)
const CONNECT_TIMEOUT_SECS: u64 = 30;
/// Request timeout (local inference can be slow)
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Supported provider identities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Self-hosted `OpenAI`-compatible server (Ollama)
    Ollama,
    /// `OpenAI` cloud
    #[serde(rename = "openai")]
    OpenAi,
}

impl LlmProvider {
    /// Every supported provider, in declaration order
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Ollama, Self::OpenAi]
    }

    /// Stable identifier used in configuration and logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAi => "openai",
        }
    }

    /// Human-readable provider name
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Ollama => "Ollama (Local)",
            Self::OpenAi => "OpenAI",
        }
    }

    /// Whether the provider serves `/v1/images/generations`
    #[must_use]
    pub const fn supports_image_generation(&self) -> bool {
        matches!(self, Self::OpenAi)
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmProvider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" | "local" | "self-hosted" => Ok(Self::Ollama),
            "openai" | "cloud" => Ok(Self::OpenAi),
            "" => Err(AppError::config("LLM provider is required in configuration")),
            other => Err(AppError::config_invalid(format!(
                "Unsupported LLM provider: {other}"
            ))),
        }
    }
}

/// Provider configuration, one variant per provider carrying only its fields
#[derive(Clone, PartialEq, Eq)]
pub enum LlmConfiguration {
    /// Self-hosted server reachable at `base_url`
    SelfHosted {
        /// Server address without the `/v1` suffix
        base_url: String,
        /// Optional bearer token for servers behind an auth proxy
        api_key: Option<String>,
        /// Optional organization header
        organization: Option<String>,
    },
    /// `OpenAI` cloud, which always requires a credential
    Cloud {
        /// API key sent as a bearer token
        api_key: String,
        /// Optional `OpenAI-Organization` header
        organization: Option<String>,
        /// API address, overridable for proxies and tests
        base_url: String,
    },
}

impl fmt::Debug for LlmConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfHosted {
                base_url,
                api_key,
                organization,
            } => f
                .debug_struct("SelfHosted")
                .field("base_url", base_url)
                .field("api_key", &api_key.as_ref().map(|_| "<redacted>"))
                .field("organization", organization)
                .finish(),
            Self::Cloud {
                organization,
                base_url,
                ..
            } => f
                .debug_struct("Cloud")
                .field("api_key", &"<redacted>")
                .field("organization", organization)
                .field("base_url", base_url)
                .finish(),
        }
    }
}

impl LlmConfiguration {
    /// Self-hosted configuration, defaulting to a local Ollama address
    #[must_use]
    pub fn self_hosted(base_url: Option<&str>) -> Self {
        Self::SelfHosted {
            base_url: base_url
                .unwrap_or(DEFAULT_SELF_HOSTED_BASE_URL)
                .to_owned(),
            api_key: None,
            organization: None,
        }
    }

    /// Cloud configuration against the public `OpenAI` API
    #[must_use]
    pub fn cloud(api_key: impl Into<String>) -> Self {
        Self::Cloud {
            api_key: api_key.into(),
            organization: None,
            base_url: DEFAULT_CLOUD_BASE_URL.to_owned(),
        }
    }

    /// Build a configuration from loosely-typed parts
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the provider is absent or unknown, or
    /// if the selected provider's required fields are missing.
    pub fn from_parts(
        provider: Option<&str>,
        base_url: Option<&str>,
        api_key: Option<&str>,
        organization: Option<&str>,
    ) -> AppResult<Self> {
        let provider: LlmProvider = provider
            .ok_or_else(|| AppError::config("LLM provider is required in configuration"))?
            .parse()?;
        let non_empty = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(ToOwned::to_owned)
        };

        let config = match provider {
            LlmProvider::Ollama => Self::SelfHosted {
                base_url: non_empty(base_url)
                    .unwrap_or_else(|| DEFAULT_SELF_HOSTED_BASE_URL.to_owned()),
                api_key: non_empty(api_key),
                organization: non_empty(organization),
            },
            LlmProvider::OpenAi => Self::Cloud {
                api_key: non_empty(api_key)
                    .ok_or_else(|| AppError::config("OpenAI requires an API key"))?,
                organization: non_empty(organization),
                base_url: non_empty(base_url).unwrap_or_else(|| DEFAULT_CLOUD_BASE_URL.to_owned()),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables
    ///
    /// Reads `LLM_CHAT_PROVIDER`, `LLM_CHAT_BASE_URL`, `LLM_CHAT_API_KEY`
    /// (falling back to `OPENAI_API_KEY`), and `LLM_CHAT_ORGANIZATION`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error under the same rules as [`Self::from_parts`].
    pub fn from_env() -> AppResult<Self> {
        let api_key = env_non_empty(API_KEY_ENV).or_else(|| env_non_empty(OPENAI_API_KEY_ENV));
        Self::from_parts(
            env_non_empty(PROVIDER_ENV).as_deref(),
            env_non_empty(BASE_URL_ENV).as_deref(),
            api_key.as_deref(),
            env_non_empty(ORGANIZATION_ENV).as_deref(),
        )
    }

    /// Check provider-specific requirements
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a required field is blank or the base
    /// URL is not an `http(s)` address.
    pub fn validate(&self) -> AppResult<()> {
        match self {
            Self::SelfHosted { base_url, .. } => {
                if base_url.trim().is_empty() {
                    return Err(AppError::config("Ollama requires a base URL"));
                }
            }
            Self::Cloud { api_key, base_url, .. } => {
                if api_key.trim().is_empty() {
                    return Err(AppError::config("OpenAI requires an API key"));
                }
                if base_url.trim().is_empty() {
                    return Err(AppError::config("OpenAI requires a base URL"));
                }
            }
        }
        let base_url = self.base_url();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AppError::config_invalid(format!(
                "Base URL must start with http:// or https://: {base_url}"
            )));
        }
        Ok(())
    }

    /// Provider identity of this configuration
    #[must_use]
    pub const fn provider(&self) -> LlmProvider {
        match self {
            Self::SelfHosted { .. } => LlmProvider::Ollama,
            Self::Cloud { .. } => LlmProvider::OpenAi,
        }
    }

    /// Server address without trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        match self {
            Self::SelfHosted { base_url, .. } | Self::Cloud { base_url, .. } => {
                base_url.trim_end_matches('/')
            }
        }
    }

    /// Bearer credential, if any
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        match self {
            Self::SelfHosted { api_key, .. } => api_key.as_deref(),
            Self::Cloud { api_key, .. } => Some(api_key),
        }
    }

    /// Organization header value, if any
    #[must_use]
    pub fn organization(&self) -> Option<&str> {
        match self {
            Self::SelfHosted { organization, .. } | Self::Cloud { organization, .. } => {
                organization.as_deref()
            }
        }
    }

    /// Set the organization header value
    #[must_use]
    pub fn with_organization(mut self, value: impl Into<String>) -> Self {
        match &mut self {
            Self::SelfHosted { organization, .. } | Self::Cloud { organization, .. } => {
                *organization = Some(value.into());
            }
        }
        self
    }

    /// Override the server address
    #[must_use]
    pub fn with_base_url(mut self, value: impl Into<String>) -> Self {
        match &mut self {
            Self::SelfHosted { base_url, .. } | Self::Cloud { base_url, .. } => {
                *base_url = value.into();
            }
        }
        self
    }
}

/// Timeouts for the underlying HTTP client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpClientConfig {
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// Whole-request timeout, including streamed bodies
    pub request_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}
