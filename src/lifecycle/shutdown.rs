//! Shutdown coordination for the proxy.

use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinSet;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for in-flight sessions to finish on their own, up to `grace`
/// when one is given.
///
/// Returns how many were still running when the grace period ran out;
/// those are aborted when the set is dropped.
pub async fn drain(mut sessions: JoinSet<()>, grace: Option<Duration>) -> usize {
    let all_done = async {
        while let Some(joined) = sessions.join_next().await {
            if let Err(e) = joined {
                if e.is_panic() {
                    tracing::error!(error = %e, "Session task panicked");
                }
            }
        }
    };

    let Some(grace) = grace else {
        all_done.await;
        return 0;
    };
    let finished = tokio::time::timeout(grace, all_done).await.is_ok();
    if finished {
        0
    } else {
        sessions.len()
    }
}
