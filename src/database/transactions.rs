// ABOUTME: RAII transaction guard for composite conversation cache operations
// ABOUTME: Rolls back automatically on drop and settles an operation's outcome as commit or rollback
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Transaction management with RAII guards
//!
//! Every multi-statement mutation of the cache runs inside a
//! [`TransactionGuard`]. The guard either commits or rolls back; if it is
//! dropped while still holding the transaction, `SQLx` rolls it back.
//!
//! ```text
//! let mut guard = SqliteTransactionGuard::new(pool.begin().await?);
//! let outcome = insert_then_touch(guard.executor()?).await;
//! guard.settle(outcome).await
//! ```

use sqlx::{Database, Transaction};
use tracing::{debug, error, warn};

use crate::errors::{AppError, AppResult};

/// RAII guard for database transactions ensuring rollback unless committed
///
/// Commit and rollback consume the guard, so a transaction cannot be
/// finished twice.
pub struct TransactionGuard<'c, DB: Database> {
    transaction: Option<Transaction<'c, DB>>,
}

impl<'c, DB: Database> TransactionGuard<'c, DB> {
    /// Wrap a transaction obtained from `pool.begin().await`
    #[must_use]
    pub fn new(transaction: Transaction<'c, DB>) -> Self {
        debug!("Transaction opened");
        Self {
            transaction: Some(transaction),
        }
    }

    /// Commit the transaction and consume the guard
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails or the transaction was already consumed
    pub async fn commit(mut self) -> AppResult<()> {
        let tx = self
            .transaction
            .take()
            .ok_or_else(|| AppError::internal("Transaction already consumed - cannot commit"))?;
        tx.commit().await.map_err(|e| {
            AppError::database(format!("Transaction commit failed: {e}")).with_source(e)
        })?;
        debug!("Transaction committed");
        Ok(())
    }

    /// Roll back the transaction and consume the guard
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails or the transaction was already consumed
    pub async fn rollback(mut self) -> AppResult<()> {
        let tx = self
            .transaction
            .take()
            .ok_or_else(|| AppError::internal("Transaction already consumed - cannot rollback"))?;
        tx.rollback().await.map_err(|e| {
            AppError::database(format!("Transaction rollback failed: {e}")).with_source(e)
        })?;
        debug!("Transaction rolled back");
        Ok(())
    }

    /// Commit on success; roll back and return the original error on failure
    ///
    /// A rollback failure is logged and the operation's own error is still
    /// the one returned.
    ///
    /// # Errors
    ///
    /// Returns `outcome`'s error, or the commit error if committing fails
    pub async fn settle<T>(self, outcome: AppResult<T>) -> AppResult<T> {
        match outcome {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_error) = self.rollback().await {
                    error!(error = %rollback_error, "Rollback after failed operation also failed");
                }
                warn!(error = %e, "Operation failed; transaction rolled back");
                Err(e)
            }
        }
    }

    /// Whether the guard still holds an open transaction
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.transaction.is_some()
    }

    /// Connection to run statements on inside the transaction
    ///
    /// # Errors
    ///
    /// Returns an error if the guard was already committed or rolled back
    pub fn executor(&mut self) -> AppResult<&mut <DB as Database>::Connection> {
        self.transaction.as_deref_mut().ok_or_else(|| {
            AppError::internal("Transaction already consumed - guard used after commit/rollback")
        })
    }
}

impl<DB: Database> Drop for TransactionGuard<'_, DB> {
    fn drop(&mut self) {
        if self.transaction.is_some() {
            warn!("Transaction dropped without commit - rolling back");
        }
    }
}

/// `SQLite` transaction guard
pub type SqliteTransactionGuard<'c> = TransactionGuard<'c, sqlx::Sqlite>;
