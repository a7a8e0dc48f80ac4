//! Cooperative cancellation for driver calls.
//!
//! A [`Context`] is passed to every capability operation. Outbound requests
//! race the context's cancellation signal and are abandoned with
//! [`Error::Cancelled`] as soon as the paired [`CancelHandle`] fires.

use std::future::Future;

use tokio::sync::watch;

use crate::error::{Error, Result};

/// Execution context carried through every operation.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancel: Option<watch::Receiver<bool>>,
}

/// Cancels every clone of the [`Context`] it was created with.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl Context {
    /// A context that is never cancelled.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// A cancellable context and its handle.
    #[must_use]
    pub fn with_cancel() -> (Self, CancelHandle) {
        let (sender, receiver) = watch::channel(false);
        (
            Self {
                cancel: Some(receiver),
            },
            CancelHandle { sender },
        )
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once the context is cancelled; never resolves otherwise.
    pub async fn cancelled(&self) {
        let Some(rx) = &self.cancel else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            // Handle dropped without cancelling.
            std::future::pending::<()>().await;
        }
    }

    /// Run `fut` unless the context is cancelled first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if the context is cancelled before or
    /// while `fut` runs, otherwise whatever `fut` returns.
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        tokio::select! {
            biased;
            () = self.cancelled() => Err(Error::Cancelled),
            result = fut => result,
        }
    }
}

impl CancelHandle {
    /// Request cancellation.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}
