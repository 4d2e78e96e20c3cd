//! Per-request execution context for storage calls.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::ports::{RepositoryError, RepositoryResult};

/// Deadline and cancellation signal carried into every storage operation.
///
/// Storage implementations wrap their I/O in [`Context::run`]; nothing above
/// the storage layer inspects it.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

/// Owner side of a [`Context`] cancellation signal.
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.0.send(true);
    }
}

impl Context {
    /// A context with neither deadline nor cancellation.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            cancel: None,
        }
    }

    /// Builds a context from an optional timeout; `None` means no deadline.
    pub fn from_timeout(timeout: Option<Duration>) -> Self {
        timeout.map(Self::with_timeout).unwrap_or_default()
    }

    /// Attaches a cancellation signal and returns the handle that fires it.
    pub fn cancellable(mut self) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        self.cancel = Some(rx);
        (self, CancelHandle(tx))
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map_or(false, |rx| *rx.borrow())
    }

    /// Checks the context before any work is started.
    pub fn check(&self) -> RepositoryResult<()> {
        if self.is_cancelled() {
            return Err(RepositoryError::Cancelled);
        }
        if self.deadline.map_or(false, |deadline| Instant::now() >= deadline) {
            return Err(RepositoryError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Drives `fut` to completion unless the deadline passes or the context is
    /// cancelled first, in which case `fut` is dropped.
    pub async fn run<F, T>(&self, fut: F) -> RepositoryResult<T>
    where
        F: Future<Output = RepositoryResult<T>>,
    {
        self.check()?;

        let mut cancel = self.cancel.clone();
        let cancelled = async {
            match cancel.as_mut() {
                Some(rx) => {
                    while !*rx.borrow_and_update() {
                        if rx.changed().await.is_err() {
                            // Sender dropped without cancelling.
                            std::future::pending::<()>().await;
                        }
                    }
                }
                None => std::future::pending::<()>().await,
            }
        };

        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            result = fut => result,
            _ = cancelled => Err(RepositoryError::Cancelled),
            _ = expired => Err(RepositoryError::DeadlineExceeded),
        }
    }
}
