// ABOUTME: Unified error type and categorised error codes for client and cache failures
// ABOUTME: Maps configuration, capability, transport, protocol, decode, and storage failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling
//!
//! Every failure surfaced by this crate is an [`AppError`] carrying an
//! [`ErrorCode`] and a human-readable message derived from the provider or the
//! store. Codes are grouped into [`ErrorCategory`] values so callers can decide
//! on retry or recovery without matching on individual codes.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Standard error codes used throughout the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    // Configuration (1000-1999)
    #[serde(rename = "CONFIG_MISSING")]
    ConfigMissing = 1000,
    #[serde(rename = "CONFIG_INVALID")]
    ConfigInvalid = 1001,

    // Capability (2000-2999)
    #[serde(rename = "UNSUPPORTED_OPERATION")]
    UnsupportedOperation = 2000,

    // Validation (3000-3999)
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,

    // Resource Management (4000-4999)
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    ResourceNotFound = 4000,

    // External Services (5000-5999)
    #[serde(rename = "EXTERNAL_SERVICE_ERROR")]
    ExternalServiceError = 5000,
    #[serde(rename = "EXTERNAL_SERVICE_UNAVAILABLE")]
    ExternalServiceUnavailable = 5001,
    #[serde(rename = "EXTERNAL_AUTH_FAILED")]
    ExternalAuthFailed = 5002,
    #[serde(rename = "EXTERNAL_RATE_LIMITED")]
    ExternalRateLimited = 5003,

    // Lifecycle (7000-7999)
    #[serde(rename = "OPERATION_CANCELLED")]
    OperationCancelled = 7000,

    // Internal Errors (9000-9999)
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError = 9001,
    #[serde(rename = "SERIALIZATION_ERROR")]
    SerializationError = 9002,
}

/// Coarse failure taxonomy used for recovery decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Client was misconstructed (bad or missing provider, credential, URL)
    Configuration,
    /// Operation not supported by the configured provider
    Capability,
    /// Request never reached the provider or no response came back
    Transport,
    /// Provider answered with a structured non-2xx failure
    Protocol,
    /// A payload could not be parsed
    Decode,
    /// An operation referenced an id that does not exist
    NotFound,
    /// Local store failure
    Storage,
    /// Caller cancelled the operation
    Cancelled,
    /// Invalid caller input or internal invariant violation
    Internal,
}

impl ErrorCode {
    /// Category this code belongs to
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigMissing | Self::ConfigInvalid => ErrorCategory::Configuration,
            Self::UnsupportedOperation => ErrorCategory::Capability,
            Self::ExternalServiceUnavailable => ErrorCategory::Transport,
            Self::ExternalServiceError | Self::ExternalAuthFailed | Self::ExternalRateLimited => {
                ErrorCategory::Protocol
            }
            Self::SerializationError => ErrorCategory::Decode,
            Self::ResourceNotFound => ErrorCategory::NotFound,
            Self::DatabaseError => ErrorCategory::Storage,
            Self::OperationCancelled => ErrorCategory::Cancelled,
            Self::InvalidInput | Self::InternalError => ErrorCategory::Internal,
        }
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::ConfigMissing => "Required configuration is missing",
            Self::ConfigInvalid => "Configuration is invalid",
            Self::UnsupportedOperation => "The operation is not supported by this provider",
            Self::InvalidInput => "The provided input is invalid",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::ExternalServiceError => "An external service encountered an error",
            Self::ExternalServiceUnavailable => "An external service is currently unavailable",
            Self::ExternalAuthFailed => "Authentication with external service failed",
            Self::ExternalRateLimited => "External service rate limit exceeded",
            Self::OperationCancelled => "The operation was cancelled",
            Self::InternalError => "An internal error occurred",
            Self::DatabaseError => "Database operation failed",
            Self::SerializationError => "Data serialization/deserialization failed",
        }
    }
}

/// Unified error type for the crate
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// HTTP status returned by the provider, for protocol errors
    pub status: Option<u16>,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Attach the provider's HTTP status
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Category of this error
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// Missing required configuration
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigMissing, message)
    }

    /// Present but unusable configuration
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalid, message)
    }

    /// Operation not supported by the named provider
    pub fn unsupported(provider: impl fmt::Display, operation: &str) -> Self {
        Self::new(
            ErrorCode::UnsupportedOperation,
            format!("{operation} is not supported by provider {provider}"),
        )
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Network failure before a response was obtained
    pub fn transport(service: impl fmt::Display, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceUnavailable,
            format!("{service}: {}", message.into()),
        )
    }

    /// Structured failure returned by an external service
    pub fn external_service(service: impl fmt::Display, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceError,
            format!("{service}: {}", message.into()),
        )
    }

    /// Non-2xx response from a provider, classified by HTTP status
    pub fn provider(service: impl fmt::Display, status: u16, message: impl Into<String>) -> Self {
        let code = match status {
            401 | 403 => ErrorCode::ExternalAuthFailed,
            404 => ErrorCode::ResourceNotFound,
            429 => ErrorCode::ExternalRateLimited,
            _ => ErrorCode::ExternalServiceError,
        };
        Self::new(
            code,
            format!("{service} API error ({status}): {}", message.into()),
        )
        .with_status(status)
    }

    /// Payload could not be decoded
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message)
    }

    /// Database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Operation cancelled by the caller
    pub fn cancelled(operation: &str) -> Self {
        Self::new(
            ErrorCode::OperationCancelled,
            format!("{operation} was cancelled"),
        )
    }

    /// Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        Self::database(error.to_string()).with_source(error)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        Self::transport("HTTP", error.to_string()).with_source(error)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::decode(error.to_string()).with_source(error)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal(format!("{error:#}"))
    }
}
