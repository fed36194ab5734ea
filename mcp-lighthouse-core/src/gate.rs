//! Serialization of audits that share one remote debugging port.

use std::future::Future;
use tokio::sync::Mutex;

/// Admits one guarded operation at a time, in arrival order.
///
/// Backed by tokio's `Mutex`, which queues waiters FIFO. The guard is dropped
/// when the operation finishes however it finishes, so an error or panic in
/// one holder never blocks the next. There is no timeout: a hung holder keeps
/// the queue waiting until the caller's own timeout drops it.
#[derive(Debug, Default)]
pub struct AuditGate {
    lock: Mutex<()>,
}

impl AuditGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the gate, then run `op` while holding it.
    pub async fn run<F, T>(&self, op: F) -> T
    where
        F: Future<Output = T>,
    {
        let _held = self.lock.lock().await;
        tracing::debug!("Audit gate acquired");
        op.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::{oneshot, Mutex as AsyncMutex};

    #[tokio::test]
    async fn test_operations_do_not_overlap_and_keep_call_order() {
        let gate = Arc::new(AuditGate::new());
        let log = Arc::new(AsyncMutex::new(Vec::new()));
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let first = {
            let gate = gate.clone();
            let log = log.clone();
            tokio::spawn(async move {
                gate.run(async {
                    log.lock().await.push("first:start");
                    let _ = started_tx.send(());
                    let _ = release_rx.await;
                    log.lock().await.push("first:end");
                })
                .await
            })
        };

        started_rx.await.unwrap();

        let second = {
            let gate = gate.clone();
            let log = log.clone();
            tokio::spawn(async move {
                gate.run(async {
                    log.lock().await.push("second:start");
                    log.lock().await.push("second:end");
                })
                .await
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(*log.lock().await, vec!["first:start"]);

        release_tx.send(()).unwrap();
        first.await.unwrap();
        second.await.unwrap();

        assert_eq!(
            *log.lock().await,
            vec!["first:start", "first:end", "second:start", "second:end"]
        );
    }

    #[tokio::test]
    async fn test_failure_does_not_block_next_holder() {
        let gate = AuditGate::new();

        let failed: Result<(), String> = gate.run(async { Err("engine crashed".to_string()) }).await;
        assert!(failed.is_err());

        let next = tokio::time::timeout(Duration::from_secs(1), gate.run(async { 42 }))
            .await
            .expect("gate should be free after a failed holder");
        assert_eq!(next, 42);
    }

    #[tokio::test]
    async fn test_dropped_holder_releases_gate() {
        let gate = Arc::new(AuditGate::new());

        let hung = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.run(std::future::pending::<()>()).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        hung.abort();
        let _ = hung.await;

        let next = tokio::time::timeout(Duration::from_secs(1), gate.run(async { "ok" }))
            .await
            .expect("gate should be free after the holder was cancelled");
        assert_eq!(next, "ok");
    }
}
