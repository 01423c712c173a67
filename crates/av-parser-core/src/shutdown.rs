//! Interrupt handling: one Ctrl+C cancels the shared token

use std::future::Future;
use std::io;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Background task racing an interrupt against run completion.
#[derive(Debug)]
pub struct InterruptListener {
    done: CancellationToken,
    handle: JoinHandle<bool>,
}

impl InterruptListener {
    /// Listen for Ctrl+C and cancel `cancel` when it arrives.
    pub fn spawn(cancel: CancellationToken) -> Self {
        Self::spawn_with(cancel, tokio::signal::ctrl_c())
    }

    /// Like [`spawn`](Self::spawn) with an arbitrary interrupt source.
    ///
    /// The listener fires at most once; it is not re-armed.
    pub fn spawn_with<S>(cancel: CancellationToken, interrupt: S) -> Self
    where
        S: Future<Output = io::Result<()>> + Send + 'static,
    {
        let done = CancellationToken::new();
        let finished = done.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                res = interrupt => match res {
                    Ok(()) => {
                        warn!("Interrupt received, cancelling run");
                        cancel.cancel();
                        true
                    }
                    Err(e) => {
                        warn!("Failed to listen for interrupt: {}", e);
                        false
                    }
                },
                _ = finished.cancelled() => false,
            }
        });

        Self { done, handle }
    }

    /// Signal completion and stop listening. Returns whether an interrupt fired.
    pub async fn finish(self) -> bool {
        self.done.cancel();
        self.handle.await.unwrap_or(false)
    }
}
