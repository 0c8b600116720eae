// ABOUTME: Record types returned by the conversation cache
// ABOUTME: Maps SQLite rows for chats, messages, and chat summaries into typed structs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteQueryResult, SqliteRow};
use sqlx::Row;

use crate::errors::AppResult;
use crate::models::Role;

/// Outcome of a write statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    /// Row id generated by the last insert
    pub last_insert_row_id: i64,
    /// Rows changed by the statement
    pub changes: u64,
}

impl From<&SqliteQueryResult> for RunResult {
    fn from(result: &SqliteQueryResult) -> Self {
        Self {
            last_insert_row_id: result.last_insert_rowid(),
            changes: result.rows_affected(),
        }
    }
}

/// A chat conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    /// Generated chat id
    pub id: i64,
    /// Chat title
    pub title: String,
    /// Owning user, if recorded
    pub owner: Option<String>,
    /// Creation time, unix seconds
    pub created_at: i64,
    /// Last activity (message appended or rename), unix seconds
    pub updated_at: i64,
}

impl ChatRecord {
    pub(super) fn from_row(row: &SqliteRow) -> AppResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            owner: row.try_get("owner")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// A chat annotated with message statistics, as listed by `list_chats`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSummary {
    /// The chat itself
    #[serde(flatten)]
    pub chat: ChatRecord,
    /// Number of messages in the chat
    pub message_count: i64,
    /// Creation time of the newest message, if any
    pub last_message_at: Option<i64>,
}

impl ChatSummary {
    pub(super) fn from_row(row: &SqliteRow) -> AppResult<Self> {
        Ok(Self {
            chat: ChatRecord::from_row(row)?,
            message_count: row.try_get("message_count")?,
            last_message_at: row.try_get("last_message_at")?,
        })
    }
}

/// A stored chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Generated message id (creation order)
    pub id: i64,
    /// Parent chat
    pub chat_id: i64,
    /// Message text
    pub content: String,
    /// Author role as stored; see [`Self::known_role`]
    pub role: String,
    /// Generated image URL, for image messages
    pub image_url: Option<String>,
    /// Prompt that produced the image
    pub prompt: Option<String>,
    /// Creation time, unix seconds
    pub created_at: i64,
}

impl MessageRecord {
    pub(super) fn from_row(row: &SqliteRow) -> AppResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            chat_id: row.try_get("chat_id")?,
            content: row.try_get("content")?,
            role: row.try_get("role")?,
            image_url: row.try_get("image_url")?,
            prompt: row.try_get("prompt")?,
            created_at: row.try_get("created_at")?,
        })
    }

    /// Typed role, or `None` for a role this crate does not model
    #[must_use]
    pub fn known_role(&self) -> Option<Role> {
        self.role.parse().ok()
    }
}
