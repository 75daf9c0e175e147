// Shutdown Token for background tasks

use tokio::sync::watch;

/// Observed by long-running tasks (journal writer) to stop cleanly
#[derive(Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    /// Check if shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown is requested (or the sender is gone)
    pub async fn wait(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Owned by the composition root
pub struct ShutdownSender {
    tx: watch::Sender<bool>,
}

impl ShutdownSender {
    /// Signal shutdown to every token
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

/// Create a shutdown channel
pub fn shutdown_channel() -> (ShutdownSender, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSender { tx }, ShutdownToken { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, assert_ready, task};

    #[test]
    fn test_wait_is_pending_until_shutdown() {
        let (tx, mut token) = shutdown_channel();
        assert!(!token.is_shutdown());
        {
            let mut wait = task::spawn(token.wait());
            assert_pending!(wait.poll());

            tx.shutdown();
            assert!(wait.is_woken());
            assert_ready!(wait.poll());
        }
        assert!(token.is_shutdown());
    }

    #[test]
    fn test_wait_returns_when_sender_dropped() {
        let (tx, mut token) = shutdown_channel();
        let mut wait = task::spawn(token.wait());
        assert_pending!(wait.poll());

        drop(tx);
        assert_ready!(wait.poll());
    }
}
