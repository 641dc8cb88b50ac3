//! Ctrl+C handling for in-flight turns

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cancels its token when Ctrl+C arrives while the handler is alive.
///
/// Dropping the handler stops listening, so the next Ctrl+C at a prompt
/// falls through to the default behavior.
pub struct SignalHandler {
    token: CancellationToken,
    task_handle: JoinHandle<()>,
}

impl SignalHandler {
    pub fn start() -> Self {
        let token = CancellationToken::new();
        let cancel = token.clone();
        let task_handle = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::debug!("Interrupt received, cancelling turn");
                cancel.cancel();
            }
        });
        Self { token, task_handle }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for SignalHandler {
    fn drop(&mut self) {
        self.task_handle.abort();
    }
}
