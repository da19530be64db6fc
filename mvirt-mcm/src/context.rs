//! Per-request cancellation and deadline.
//!
//! Every backend call and the deletion confirmation poll run under a
//! [`RequestContext`]. Cancelling the token or reaching the deadline aborts
//! the outstanding work and surfaces as [`Interrupted`].

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

/// Why a request stopped before its work completed.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum Interrupted {
    #[error("request cancelled")]
    Cancelled,

    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Context without deadline that is never cancelled unless asked to.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_cancel(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    /// Child context that additionally expires after `timeout`.
    ///
    /// The earlier of the existing and the new deadline wins. A timeout too
    /// large to represent keeps the existing deadline.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => Self {
                cancel: self.cancel.child_token(),
                deadline: self.deadline,
            },
        }
    }

    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        };
        Self {
            cancel: self.cancel.child_token(),
            deadline: Some(deadline),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> Interrupted {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => Interrupted::Cancelled,
                    _ = sleep_until(deadline) => Interrupted::DeadlineExceeded,
                }
            }
            None => {
                self.cancel.cancelled().await;
                Interrupted::Cancelled
            }
        }
    }

    /// Run `fut` unless the context finishes first.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, Interrupted>
    where
        F: Future,
    {
        if self.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }
        tokio::select! {
            biased;
            reason = self.done() => Err(reason),
            out = fut => Ok(out),
        }
    }
}
