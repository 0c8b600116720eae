// ABOUTME: Conversation cache database configuration for SQLite files and in-memory stores
// ABOUTME: Parses database URLs and pool sizing from explicit values or the environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::env_non_empty;
use crate::errors::{AppError, AppResult};

/// Environment variable holding the cache database URL
pub const DATABASE_URL_ENV: &str = "LLM_CHAT_DATABASE_URL";
/// Environment variable holding the pool size
pub const MAX_CONNECTIONS_ENV: &str = "LLM_CHAT_DB_MAX_CONNECTIONS";

const DEFAULT_DATABASE_PATH: &str = "./data/chats.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Type-safe database location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseUrl {
    /// `SQLite` database with file path
    SQLite {
        /// Path to `SQLite` database file
        path: PathBuf,
    },
    /// In-memory `SQLite` (for testing)
    Memory,
}

impl DatabaseUrl {
    /// Parse from string with validation
    ///
    /// # Errors
    ///
    /// Returns an error if the URL names a non-`SQLite` scheme or is empty
    pub fn parse_url(s: &str) -> AppResult<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AppError::config_invalid("Database URL is empty"));
        }
        if let Some(path_str) = s.strip_prefix("sqlite:") {
            let path_str = path_str.trim_start_matches("//");
            if path_str == ":memory:" || path_str.is_empty() {
                return Ok(Self::Memory);
            }
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            return Ok(Self::SQLite {
                path: PathBuf::from(path_str),
            });
        }
        if s.contains("://") {
            return Err(AppError::config_invalid(format!(
                "Unsupported database URL (only SQLite is supported): {s}"
            )));
        }
        // Bare value: treat as SQLite file path
        Ok(Self::SQLite {
            path: PathBuf::from(s),
        })
    }

    /// Convert to connection string
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::Memory => "sqlite::memory:".into(),
        }
    }

    /// Check if this is an in-memory database
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        Self::SQLite {
            path: PathBuf::from(DEFAULT_DATABASE_PATH),
        }
    }
}

impl Display for DatabaseUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.to_connection_string())
    }
}

/// Conversation cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Database location
    pub database_url: DatabaseUrl,
    /// Maximum pooled connections
    pub max_connections: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            database_url: DatabaseUrl::default(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl CacheConfig {
    /// In-memory store, pinned to a single connection so every query sees the same database
    #[must_use]
    pub const fn in_memory() -> Self {
        Self {
            database_url: DatabaseUrl::Memory,
            max_connections: 1,
        }
    }

    /// File-backed store at `path`
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            database_url: DatabaseUrl::SQLite { path: path.into() },
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }

    /// Load cache configuration from environment
    ///
    /// # Errors
    ///
    /// Returns an error if the URL or pool size is invalid
    pub fn from_env() -> AppResult<Self> {
        let database_url = match env_non_empty(DATABASE_URL_ENV) {
            Some(url) => DatabaseUrl::parse_url(&url)?,
            None => DatabaseUrl::default(),
        };
        let max_connections = match env_non_empty(MAX_CONNECTIONS_ENV) {
            Some(raw) => raw.parse::<u32>().map_err(|e| {
                AppError::config_invalid(format!("Invalid {MAX_CONNECTIONS_ENV} value: {e}"))
            })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        if max_connections == 0 {
            return Err(AppError::config_invalid(format!(
                "{MAX_CONNECTIONS_ENV} must be at least 1"
            )));
        }

        Ok(Self {
            database_url,
            max_connections,
        })
    }

    /// Pool size actually used, accounting for in-memory databases
    #[must_use]
    pub const fn effective_max_connections(&self) -> u32 {
        if self.database_url.is_memory() {
            1
        } else {
            self.max_connections
        }
    }

    /// Check if this is an in-memory database
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        self.database_url.is_memory()
    }
}
