//! Interrupt handling for running statements.
//!
//! Every dispatched statement gets its own [`CancellationToken`] and its own
//! listener task. The listener races one interrupt against the statement's
//! completion:
//!
//! 1. Interrupt first: the token is cancelled and the statement is expected to
//!    notice it cooperatively
//! 2. Statement first: the listener stops without touching the token
//!
//! Interrupts delivered while no statement is running are never seen by a
//! later statement, because each listener subscribes only when it is armed.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Source of out-of-band interrupt notifications.
pub trait InterruptSource: Send + Sync {
    /// Future resolving at the next interrupt delivered after this call.
    fn next_interrupt(&self) -> BoxFuture<'static, ()>;
}

/// Process interrupt (Ctrl+C / SIGINT)
///
/// On Unix the signal handler is installed by `next_interrupt` itself, before
/// the returned future is first polled, so a SIGINT arriving as a statement
/// starts is caught rather than ending the process.
#[derive(Debug, Clone, Copy, Default)]
pub struct CtrlCInterrupt;

impl InterruptSource for CtrlCInterrupt {
    #[cfg(unix)]
    fn next_interrupt(&self) -> BoxFuture<'static, ()> {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::interrupt()) {
            Ok(mut sigint) => Box::pin(async move {
                if sigint.recv().await.is_none() {
                    std::future::pending::<()>().await;
                }
            }),
            Err(err) => {
                warn!("Failed to listen for Ctrl+C: {}", err);
                Box::pin(std::future::pending())
            }
        }
    }

    #[cfg(not(unix))]
    fn next_interrupt(&self) -> BoxFuture<'static, ()> {
        Box::pin(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl+C: {}", err);
                std::future::pending::<()>().await;
            }
        })
    }
}

/// Interrupts triggered programmatically.
///
/// Clones share the same channel, so one clone can be handed to the
/// controller and another kept to fire interrupts.
#[derive(Debug, Clone)]
pub struct ManualInterrupt {
    sender: broadcast::Sender<()>,
}

impl ManualInterrupt {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(16);
        Self { sender }
    }

    /// Fire an interrupt.
    ///
    /// # Returns
    /// * `usize` - Number of armed listeners that received it
    pub fn trigger(&self) -> usize {
        self.sender.send(()).unwrap_or(0)
    }
}

impl Default for ManualInterrupt {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptSource for ManualInterrupt {
    fn next_interrupt(&self) -> BoxFuture<'static, ()> {
        let mut receiver = self.sender.subscribe();
        Box::pin(async move {
            match receiver.recv().await {
                Ok(()) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => std::future::pending::<()>().await,
            }
        })
    }
}

/// Runs statements with a fresh cancellation token each
#[derive(Clone)]
pub struct CancellationController {
    interrupts: Arc<dyn InterruptSource>,
}

impl CancellationController {
    /// Create a controller listening to the given interrupt source
    pub fn new(interrupts: Arc<dyn InterruptSource>) -> Self {
        Self { interrupts }
    }

    /// Controller listening for Ctrl+C
    pub fn ctrl_c() -> Self {
        Self::new(Arc::new(CtrlCInterrupt))
    }

    /// Run `work` with a token that the next interrupt cancels.
    ///
    /// The listener is torn down before returning, whether or not it fired.
    ///
    /// # Arguments
    /// * `work` - Receives the token and returns the statement future
    ///
    /// # Returns
    /// * `T` - Whatever `work` produced
    pub async fn run<F, Fut, T>(&self, work: F) -> T
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = T>,
    {
        let token = CancellationToken::new();
        let done = CancellationToken::new();

        let interrupt = self.interrupts.next_interrupt();
        let listener = tokio::spawn({
            let token = token.clone();
            let done = done.clone();
            async move {
                tokio::select! {
                    _ = interrupt => {
                        debug!("Interrupt received, cancelling statement");
                        token.cancel();
                    }
                    _ = done.cancelled() => {}
                }
            }
        });

        let result = work(token).await;

        done.cancel();
        if let Err(err) = listener.await {
            warn!("Interrupt listener failed: {}", err);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn manual_controller() -> (CancellationController, ManualInterrupt) {
        let interrupt = ManualInterrupt::new();
        (
            CancellationController::new(Arc::new(interrupt.clone())),
            interrupt,
        )
    }

    #[tokio::test]
    async fn test_interrupt_cancels_running_work() {
        let (controller, interrupt) = manual_controller();

        let observed = controller
            .run(|token| async move {
                assert_eq!(interrupt.trigger(), 1);
                tokio::time::timeout(Duration::from_secs(5), token.cancelled())
                    .await
                    .is_ok()
            })
            .await;

        assert!(observed);
    }

    #[tokio::test]
    async fn test_work_completing_first_is_not_cancelled() {
        let (controller, _interrupt) = manual_controller();

        let token = controller.run(|token| async move { token }).await;
        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn test_interrupt_does_not_leak_into_next_statement() {
        let (controller, interrupt) = manual_controller();

        let first = controller
            .run(|token| {
                let interrupt = interrupt.clone();
                async move {
                    interrupt.trigger();
                    token.cancelled().await;
                    token
                }
            })
            .await;
        assert!(first.is_cancelled());

        // fired between statements, nobody is listening
        assert_eq!(interrupt.trigger(), 0);

        let second = controller
            .run(|token| async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                token
            })
            .await;
        assert!(!second.is_cancelled());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_ctrl_c_handler_installed_before_first_poll() {
        let interrupt = CtrlCInterrupt.next_interrupt();

        // The signal lands before the future is polled.
        let status = std::process::Command::new("kill")
            .args(["-INT", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        assert!(
            tokio::time::timeout(Duration::from_secs(5), interrupt)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_listener_released_after_run() {
        let (controller, interrupt) = manual_controller();

        controller.run(|_token| async {}).await;
        assert_eq!(interrupt.trigger(), 0);
    }
}
