// ABOUTME: Cooperative cancellation token for long-running streaming requests
// ABOUTME: Clonable handle backed by a tokio watch channel, awaited inside read loops
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use tokio::sync::watch;

/// Cancellation signal shared between a caller and an in-flight operation
///
/// Clones observe the same signal. Cancelling is idempotent and cannot be
/// undone; create a new token for the next operation.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    sender: Arc<watch::Sender<bool>>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    /// Create a token in the not-cancelled state
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Signal cancellation to every holder of this token
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Whether cancellation has been requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolve once cancellation has been requested
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives in `self`, so `wait_for` can only fail after we are gone
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}
