// ABOUTME: Logging configuration and structured logging setup for the client and cache
// ABOUTME: Configures log level, output format, and noise reduction for HTTP and SQL dependencies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Structured logging built on `tracing`
//!
//! The library only emits events; installing a subscriber is left to the
//! embedding application, which may call [`init_from_env`] for a sensible
//! default.

use std::env;
use std::io;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{
    filter::Directive,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Dependencies whose logs are capped regardless of `RUST_LOG`
const NOISY_TARGETS: &[(&str, tracing::Level)] = &[
    ("hyper", tracing::Level::WARN),
    ("hyper_util", tracing::Level::WARN),
    ("reqwest", tracing::Level::WARN),
    ("sqlx", tracing::Level::INFO),
    ("sqlx::query", tracing::Level::WARN),
];

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty, compact)
    pub format: LogFormat,
    /// Include source file and line numbers
    pub include_location: bool,
    /// Include span open/close events
    pub include_spans: bool,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// `JSON` format for production logging
    Json,
    /// Pretty format for development
    Pretty,
    /// Compact format for space-constrained environments
    Compact,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            "compact" => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
            include_location: false,
            include_spans: false,
        }
    }
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    ///
    /// Reads `RUST_LOG`, `LOG_FORMAT`, `LOG_INCLUDE_LOCATION`, and `LOG_INCLUDE_SPANS`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            level: env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
            format: env::var("LOG_FORMAT")
                .map(|value| LogFormat::parse(&value))
                .unwrap_or(LogFormat::Pretty),
            include_location: env::var("LOG_INCLUDE_LOCATION").is_ok(),
            include_spans: env::var("LOG_INCLUDE_SPANS").is_ok(),
        }
    }

    /// Filter combining the configured level with noise reduction rules
    #[must_use]
    pub fn env_filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::new(&self.level);
        for (target, level) in NOISY_TARGETS {
            filter = filter.add_directive(directive(&format!("{target}={level}"), *level));
        }
        // Keep our own events at the requested level even when RUST_LOG is a bare directive list
        if !self.level.contains('=') {
            filter = filter.add_directive(directive(
                &format!("llm_chat_core={}", self.level),
                tracing::Level::INFO,
            ));
        }
        filter
    }

    /// Initialize the global tracing subscriber
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed
    pub fn init(&self) -> Result<()> {
        let registry = tracing_subscriber::registry().with(self.env_filter());
        let span_events = if self.include_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        match self.format {
            LogFormat::Json => {
                let json_layer = fmt::layer()
                    .with_file(self.include_location)
                    .with_line_number(self.include_location)
                    .with_target(true)
                    .with_writer(io::stdout)
                    .with_span_events(span_events)
                    .json();
                registry.with(json_layer).try_init()?;
            }
            LogFormat::Pretty => {
                let pretty_layer = fmt::layer()
                    .with_file(self.include_location)
                    .with_line_number(self.include_location)
                    .with_target(true)
                    .with_writer(io::stdout)
                    .with_span_events(span_events);
                registry.with(pretty_layer).try_init()?;
            }
            LogFormat::Compact => {
                let compact_layer = fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(io::stdout)
                    .with_span_events(FmtSpan::NONE);
                registry.with(compact_layer).try_init()?;
            }
        }

        info!(
            service.name = env!("CARGO_PKG_NAME"),
            service.version = env!("CARGO_PKG_VERSION"),
            log.level = %self.level,
            log.format = ?self.format,
            "Logging initialized"
        );
        Ok(())
    }
}

fn directive(raw: &str, fallback: tracing::Level) -> Directive {
    raw.parse().unwrap_or_else(|_| fallback.into())
}

/// Initialize logging with default configuration
///
/// # Errors
///
/// Returns an error if logging initialization fails
pub fn init_default() -> Result<()> {
    LoggingConfig::default().init()
}

/// Initialize logging from environment
///
/// # Errors
///
/// Returns an error if logging initialization fails
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}
