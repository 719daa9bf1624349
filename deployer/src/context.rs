//! Per-call cancellation and deadline

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

use crate::errors::DeployerError;

/// Cancels every [`CallContext`] derived from it
#[derive(Debug)]
pub struct Canceller {
    tx: watch::Sender<bool>,
}

impl Canceller {
    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Cancellation signal and optional deadline handed to each operation
#[derive(Debug, Clone)]
pub struct CallContext {
    cancel_rx: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

impl Default for CallContext {
    fn default() -> Self {
        Self::background()
    }
}

impl CallContext {
    /// A context that is never cancelled and has no deadline
    pub fn background() -> Self {
        Self {
            cancel_rx: None,
            deadline: None,
        }
    }

    /// A context plus the handle that cancels it
    pub fn with_cancel() -> (Self, Canceller) {
        let (tx, rx) = watch::channel(false);
        (
            Self {
                cancel_rx: Some(rx),
                deadline: None,
            },
            Canceller { tx },
        )
    }

    /// Derive a context that also expires after `timeout`.
    /// An earlier existing deadline is kept.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Fail fast if the context is already done
    pub fn check(&self) -> Result<(), DeployerError> {
        if self.is_cancelled() {
            return Err(DeployerError::Cancelled("operation cancelled".to_string()));
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(DeployerError::Cancelled("deadline exceeded".to_string()));
        }
        Ok(())
    }

    /// Drive `fut` to completion unless the context is cancelled or its
    /// deadline passes first. The losing future is dropped, which aborts any
    /// in-flight request it owns.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, DeployerError>
    where
        F: Future<Output = Result<T, DeployerError>>,
    {
        self.check()?;

        let mut cancel_rx = self.cancel_rx.clone();
        let cancelled = async {
            match cancel_rx.as_mut() {
                Some(rx) => {
                    // A dropped canceller can never fire
                    if rx.wait_for(|c| *c).await.is_err() {
                        std::future::pending::<()>().await;
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
            _ = cancelled => {
                debug!("Call cancelled by caller");
                Err(DeployerError::Cancelled("operation cancelled".to_string()))
            }
            _ = expired => {
                debug!("Call deadline exceeded");
                Err(DeployerError::Cancelled("deadline exceeded".to_string()))
            }
        }
    }
}
