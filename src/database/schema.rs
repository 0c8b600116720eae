// ABOUTME: Conversation cache schema definition and version marker handling
// ABOUTME: Creates chats, messages, and their indexes in one transaction, then stamps user_version
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::errors::{AppError, AppResult};

/// Schema version written to `PRAGMA user_version` once the tables exist
pub const SCHEMA_VERSION: i64 = 1;

const CREATE_CHATS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS chats (
        id INTEGER PRIMARY KEY NOT NULL,
        title TEXT NOT NULL,
        owner TEXT,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )
";

const CREATE_MESSAGES_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY NOT NULL,
        chat_id INTEGER NOT NULL,
        content TEXT NOT NULL,
        role TEXT NOT NULL,
        image_url TEXT,
        prompt TEXT,
        created_at INTEGER NOT NULL,
        FOREIGN KEY (chat_id) REFERENCES chats (id) ON DELETE CASCADE
    )
";

const CREATE_INDEXES: [&str; 2] = [
    "CREATE INDEX IF NOT EXISTS idx_messages_chat_id ON messages(chat_id)",
    "CREATE INDEX IF NOT EXISTS idx_messages_role ON messages(role)",
];

/// Read the `user_version` marker
pub(super) async fn read_version(pool: &SqlitePool) -> AppResult<i64> {
    let row = sqlx::query("PRAGMA user_version")
        .fetch_one(pool)
        .await
        .map_err(|e| {
            AppError::database(format!("Failed to read schema version: {e}")).with_source(e)
        })?;
    Ok(row.try_get(0)?)
}

/// Switch to write-ahead journaling and enforce foreign keys
///
/// Must run outside a transaction; `SQLite` ignores a journal mode change inside one.
pub(super) async fn apply_pragmas(pool: &SqlitePool) -> AppResult<()> {
    for pragma in ["PRAGMA journal_mode = WAL", "PRAGMA foreign_keys = ON"] {
        sqlx::query(pragma).execute(pool).await.map_err(|e| {
            AppError::database(format!("Failed to apply {pragma}: {e}")).with_source(e)
        })?;
    }
    Ok(())
}

/// Create tables and indexes, then stamp the version inside the same transaction
pub(super) async fn create(conn: &mut SqliteConnection) -> AppResult<()> {
    let statements = [CREATE_CHATS_TABLE, CREATE_MESSAGES_TABLE]
        .into_iter()
        .chain(CREATE_INDEXES);
    for statement in statements {
        sqlx::query(statement)
            .execute(&mut *conn)
            .await
            .map_err(|e| AppError::database(format!("Schema creation failed: {e}")).with_source(e))?;
    }

    // PRAGMA values cannot be bound as parameters
    sqlx::query(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            AppError::database(format!("Failed to stamp schema version: {e}")).with_source(e)
        })?;
    Ok(())
}
