use crate::services::reconciler::OrphanReconciler;
use tokio::sync::watch;
use tokio::time::{Duration, sleep};

pub struct BackgroundWorker {
    reconciler: OrphanReconciler,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl BackgroundWorker {
    pub fn new(
        reconciler: OrphanReconciler,
        interval_secs: u64,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            reconciler,
            interval: Duration::from_secs(interval_secs),
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!("🚀 Background worker started");

        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    tracing::info!("🛑 Background worker shutting down");
                    break;
                }
                _ = sleep(self.interval) => {
                    self.perform_cleanup().await;
                }
            }
        }
    }

    async fn perform_cleanup(&self) {
        tracing::info!("🧹 Running orphaned object reconciliation...");

        match self.reconciler.reconcile().await {
            Ok(deleted) => tracing::info!("✅ Reconciliation completed, {} objects removed", deleted),
            Err(e) => tracing::error!("❌ Reconciliation failed: {}", e),
        }
    }
}
