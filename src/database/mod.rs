// ABOUTME: Transactional SQLite conversation cache for chats and their messages
// ABOUTME: Owns schema lifecycle and keeps message inserts and chat timestamps atomic
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Conversation Cache
//!
//! [`MessageCache`] stores chats and messages in `SQLite`. Operations that
//! touch both tables (appending a message, renaming a chat) run inside a
//! [`TransactionGuard`] so a message never becomes visible without its
//! chat's activity timestamp moving with it.
//!
//! Concurrent writers to the same chat are serialized by `SQLite`'s own
//! write lock; there is no application-level lock. Each write reads the
//! clock only after it holds that lock, and `updated_at` never moves
//! backwards.

mod records;
mod schema;
/// RAII transaction guard
pub mod transactions;

pub use records::{ChatRecord, ChatSummary, MessageRecord, RunResult};
pub use schema::SCHEMA_VERSION;
pub use transactions::{SqliteTransactionGuard, TransactionGuard};

use std::fs;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, instrument};

use crate::config::{CacheConfig, DatabaseUrl};
use crate::errors::{AppError, AppResult};
use crate::models::Role;

/// Conversation cache over a `SQLite` pool
#[derive(Debug, Clone)]
pub struct MessageCache {
    pool: SqlitePool,
}

/// Columns of a message about to be inserted
struct NewMessage<'a> {
    chat_id: i64,
    content: &'a str,
    role: Role,
    image_url: Option<&'a str>,
    prompt: Option<&'a str>,
}

/// Current time in unix seconds; read only while holding the write lock
fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Map a write failure, turning a foreign-key violation into not-found for the chat
fn write_error(error: sqlx::Error, chat_id: i64, operation: &str) -> AppError {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.is_foreign_key_violation() {
            return AppError::not_found(format!("Chat {chat_id}"));
        }
    }
    AppError::database(format!("Failed to {operation}: {error}")).with_source(error)
}

impl MessageCache {
    /// Wrap an existing pool
    ///
    /// The pool's connections must enforce foreign keys for cascading deletes
    /// to work; [`Self::connect`] configures this.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pool for `config`, creating the database file if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the
    /// database cannot be opened.
    pub async fn connect(config: &CacheConfig) -> AppResult<Self> {
        let options = match &config.database_url {
            DatabaseUrl::Memory => SqliteConnectOptions::from_str(
                &config.database_url.to_connection_string(),
            )
            .map_err(|e| {
                AppError::database(format!("Invalid in-memory database URL: {e}")).with_source(e)
            })?,
            DatabaseUrl::SQLite { path } => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).map_err(|e| {
                        AppError::database(format!(
                            "Failed to create database directory {}: {e}",
                            parent.display()
                        ))
                        .with_source(e)
                    })?;
                }
                SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal)
            }
        }
        .foreign_keys(true);

        let mut pool_options =
            SqlitePoolOptions::new().max_connections(config.effective_max_connections());
        if config.is_memory() {
            // Closing the only connection would discard the database
            pool_options = pool_options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options.connect_with(options).await.map_err(|e| {
            AppError::database(format!(
                "Failed to open database {}: {e}",
                config.database_url
            ))
            .with_source(e)
        })?;

        info!(
            database = %config.database_url,
            max_connections = config.effective_max_connections(),
            "Conversation cache connected"
        );
        Ok(Self::new(pool))
    }

    /// Underlying pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Current `user_version` marker (0 for an uninitialized store)
    ///
    /// # Errors
    ///
    /// Returns an error if the marker cannot be read
    pub async fn schema_version(&self) -> AppResult<i64> {
        schema::read_version(&self.pool).await
    }

    /// Create the schema on first use; a no-op once the version marker is set
    ///
    /// # Errors
    ///
    /// Returns the failing statement's error after rolling the whole schema back
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> AppResult<()> {
        let version = self.schema_version().await?;
        if version >= SCHEMA_VERSION {
            debug!(version, "Schema already initialized");
            return Ok(());
        }

        schema::apply_pragmas(&self.pool).await?;

        let mut guard = SqliteTransactionGuard::new(self.pool.begin().await?);
        let outcome = schema::create(guard.executor()?).await;
        guard.settle(outcome).await?;

        info!(version = SCHEMA_VERSION, "Conversation cache schema created");
        Ok(())
    }

    /// Create a chat
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    #[instrument(skip(self, title))]
    pub async fn add_chat(&self, title: &str, owner: Option<&str>) -> AppResult<RunResult> {
        let now = unix_now();
        let result = sqlx::query(
            r"
            INSERT INTO chats (title, owner, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            ",
        )
        .bind(title)
        .bind(owner)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to add chat: {e}")).with_source(e))?;

        Ok(RunResult::from(&result))
    }

    /// Get one chat by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn get_chat(&self, chat_id: i64) -> AppResult<Option<ChatRecord>> {
        let row = sqlx::query(
            r"
            SELECT id, title, owner, created_at, updated_at
            FROM chats
            WHERE id = $1
            ",
        )
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get chat: {e}")).with_source(e))?;

        row.as_ref().map(ChatRecord::from_row).transpose()
    }

    /// List chats, most recent activity first, ties broken by newest id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_chats(&self) -> AppResult<Vec<ChatSummary>> {
        let rows = sqlx::query(
            r"
            SELECT c.id, c.title, c.owner, c.created_at, c.updated_at,
                   (SELECT COUNT(*) FROM messages m WHERE m.chat_id = c.id) AS message_count,
                   (SELECT MAX(m.created_at) FROM messages m WHERE m.chat_id = c.id) AS last_message_at
            FROM chats c
            ORDER BY c.updated_at DESC, c.id DESC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list chats: {e}")).with_source(e))?;

        rows.iter().map(ChatSummary::from_row).collect()
    }

    /// All messages of a chat in creation order
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list_messages(&self, chat_id: i64) -> AppResult<Vec<MessageRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, chat_id, content, role, image_url, prompt, created_at
            FROM messages
            WHERE chat_id = $1
            ORDER BY id ASC
            ",
        )
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list messages: {e}")).with_source(e))?;

        rows.iter().map(MessageRecord::from_row).collect()
    }

    /// Append a message and bump its chat's `updated_at` as one unit
    ///
    /// # Errors
    ///
    /// Returns not-found if the chat does not exist, or the failing
    /// statement's error; in both cases nothing is written.
    #[instrument(skip(self, content, image_url, prompt))]
    pub async fn add_message(
        &self,
        chat_id: i64,
        content: &str,
        role: Role,
        image_url: Option<&str>,
        prompt: Option<&str>,
    ) -> AppResult<RunResult> {
        let message = NewMessage {
            chat_id,
            content,
            role,
            image_url,
            prompt,
        };
        let mut guard = SqliteTransactionGuard::new(self.pool.begin().await?);
        let outcome = Self::insert_message(guard.executor()?, &message).await;
        guard.settle(outcome).await
    }

    /// Retitle a chat and bump its `updated_at` as one unit
    ///
    /// # Errors
    ///
    /// Returns not-found if the chat does not exist, or the failing
    /// statement's error; in both cases nothing is written.
    #[instrument(skip(self, title))]
    pub async fn rename_chat(&self, chat_id: i64, title: &str) -> AppResult<RunResult> {
        let mut guard = SqliteTransactionGuard::new(self.pool.begin().await?);
        let outcome = Self::retitle(guard.executor()?, chat_id, title).await;
        guard.settle(outcome).await
    }

    /// Delete a chat; its messages go with it through the cascading foreign key
    ///
    /// Deleting an unknown id is not an error and reports zero changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    #[instrument(skip(self))]
    pub async fn delete_chat(&self, chat_id: i64) -> AppResult<RunResult> {
        let result = sqlx::query("DELETE FROM chats WHERE id = $1")
            .bind(chat_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete chat: {e}")).with_source(e))?;

        Ok(RunResult::from(&result))
    }

    /// Delete every chat and, by cascade, every message
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails
    #[instrument(skip(self))]
    pub async fn clear_chat(&self) -> AppResult<RunResult> {
        let result = sqlx::query("DELETE FROM chats")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::database(format!("Failed to clear chats: {e}")).with_source(e)
            })?;

        info!(deleted = result.rows_affected(), "Conversation cache cleared");
        Ok(RunResult::from(&result))
    }

    async fn insert_message(
        conn: &mut SqliteConnection,
        message: &NewMessage<'_>,
    ) -> AppResult<RunResult> {
        Self::lock_chat(conn, message.chat_id).await?;
        let now = unix_now();

        let inserted = sqlx::query(
            r"
            INSERT INTO messages (chat_id, content, role, image_url, prompt, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(message.chat_id)
        .bind(message.content)
        .bind(message.role.as_str())
        .bind(message.image_url)
        .bind(message.prompt)
        .bind(now)
        .execute(&mut *conn)
        .await
        .map_err(|e| write_error(e, message.chat_id, "add message"))?;

        Self::touch_chat(conn, message.chat_id, now).await?;
        debug!(
            chat_id = message.chat_id,
            message_id = inserted.last_insert_rowid(),
            "Message stored"
        );
        Ok(RunResult::from(&inserted))
    }

    async fn retitle(
        conn: &mut SqliteConnection,
        chat_id: i64,
        title: &str,
    ) -> AppResult<RunResult> {
        // The first write takes the database write lock
        let renamed = sqlx::query("UPDATE chats SET title = $1 WHERE id = $2")
            .bind(title)
            .bind(chat_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| write_error(e, chat_id, "rename chat"))?;
        if renamed.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Chat {chat_id}")));
        }

        Self::touch_chat(conn, chat_id, unix_now()).await?;
        Ok(RunResult::from(&renamed))
    }

    /// Take the write lock with a no-op write, failing with not-found if the chat is gone
    ///
    /// A deferred transaction only waits for the lock at its first write, so
    /// timestamps must be read after this returns.
    async fn lock_chat(conn: &mut SqliteConnection, chat_id: i64) -> AppResult<()> {
        let locked = sqlx::query("UPDATE chats SET updated_at = updated_at WHERE id = $1")
            .bind(chat_id)
            .execute(conn)
            .await
            .map_err(|e| write_error(e, chat_id, "lock chat"))?;
        if locked.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Chat {chat_id}")));
        }
        Ok(())
    }

    /// Advance a chat's `updated_at` to `now`, failing with not-found if no row matched
    async fn touch_chat(conn: &mut SqliteConnection, chat_id: i64, now: i64) -> AppResult<()> {
        let touched =
            sqlx::query("UPDATE chats SET updated_at = MAX(updated_at, $1) WHERE id = $2")
                .bind(now)
                .bind(chat_id)
                .execute(conn)
                .await
                .map_err(|e| write_error(e, chat_id, "update chat timestamp"))?;
        if touched.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Chat {chat_id}")));
        }
        Ok(())
    }
}
