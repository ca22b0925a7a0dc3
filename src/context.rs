//! Cancellation and deadlines for in-flight work.
//!
//! A [`Context`] is cheap to clone and is handed down the call chain. Deriving a
//! context (via [`Context::with_cancel`], [`Context::with_timeout`] or
//! [`Context::with_deadline`]) keeps every ancestor's cancellation signal and the
//! earliest deadline, so a child is done as soon as any ancestor is.

use std::{future::pending, time::Duration};

use futures::{FutureExt, future::select_all};
use thiserror::Error;
use tokio::{sync::watch, time::Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("Context was cancelled")]
    Cancelled,
    #[error("Context deadline exceeded")]
    DeadlineExceeded,
}

impl ContextError {
    pub fn code(&self) -> &'static str {
        match self {
            ContextError::Cancelled => "CONTEXT_CANCELLED",
            ContextError::DeadlineExceeded => "CONTEXT_DEADLINE_EXCEEDED",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel_signals: Vec<watch::Receiver<bool>>,
}

/// Cancels the context it was created with. Dropping the handle cancels too.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

impl Drop for CancelHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl Context {
    /// Root context: never cancelled, no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let (sender, receiver) = watch::channel(false);
        let mut ctx = self.clone();
        ctx.cancel_signals.push(receiver);
        (ctx, CancelHandle { sender })
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let mut ctx = self.clone();
        ctx.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        ctx
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why the context is done, or `None` while it is still live.
    pub fn err(&self) -> Option<ContextError> {
        if self.cancel_signals.iter().any(|signal| *signal.borrow()) {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn check(&self) -> Result<(), ContextError> {
        match self.err() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Resolves once the context is cancelled or its deadline passes.
    /// Never resolves for [`Context::background`].
    pub async fn done(&self) -> ContextError {
        if let Some(err) = self.err() {
            return err;
        }

        let cancelled = async {
            if self.cancel_signals.is_empty() {
                return pending::<ContextError>().await;
            }
            let waits = self.cancel_signals.iter().map(|signal| {
                let mut signal = signal.clone();
                async move {
                    loop {
                        if *signal.borrow_and_update() {
                            break;
                        }
                        // sender is gone only after the handle set the flag
                        if signal.changed().await.is_err() {
                            break;
                        }
                    }
                }
                .boxed()
            });
            select_all(waits).await;
            ContextError::Cancelled
        };

        let expired = async {
            match self.deadline {
                Some(deadline) => {
                    tokio::time::sleep_until(deadline).await;
                    ContextError::DeadlineExceeded
                }
                None => pending::<ContextError>().await,
            }
        };

        tokio::select! {
            err = cancelled => err,
            err = expired => err,
        }
    }
}
