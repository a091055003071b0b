use super::ledger::ProgressLedger;
use super::task::FileUploader;
use super::types::{ClassificationSelection, FileSubmission, UploadError};
use futures::future::join_all;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Drives a batch through the uploader in groups of at most `batch_width`.
///
/// Groups run strictly one after another; within a group every upload runs
/// concurrently and the group settles only when all of them are terminal.
pub struct BatchScheduler {
    uploader: Arc<FileUploader>,
    batch_width: NonZeroUsize,
}

impl BatchScheduler {
    pub fn new(uploader: Arc<FileUploader>, batch_width: NonZeroUsize) -> Self {
        Self {
            uploader,
            batch_width,
        }
    }

    pub fn group_count(&self, file_count: usize) -> usize {
        file_count.div_ceil(self.batch_width.get())
    }

    /// Uploads every file, then calls `on_complete` exactly once.
    ///
    /// `ledger` must already hold a `Pending` entry per file. When `cancel`
    /// fires, the group in flight finishes and the remaining files are
    /// failed as cancelled without being dispatched.
    pub async fn run<F>(
        &self,
        files: Vec<FileSubmission>,
        selection: Arc<ClassificationSelection>,
        ledger: ProgressLedger,
        cancel: CancellationToken,
        on_complete: F,
    ) where
        F: FnOnce() + Send,
    {
        let width = self.batch_width.get();
        let total_groups = self.group_count(files.len());
        tracing::info!(
            "📦 Starting batch: {} files in {} groups of up to {}",
            files.len(),
            total_groups,
            width
        );

        for (index, group) in files.chunks(width).enumerate() {
            if cancel.is_cancelled() {
                let skipped = &files[index * width..];
                tracing::warn!(
                    "🛑 Batch cancelled before group {}/{}, skipping {} files",
                    index + 1,
                    total_groups,
                    skipped.len()
                );
                for file in skipped {
                    ledger.mark_failed(&file.id, UploadError::Cancelled.ledger_message());
                }
                break;
            }

            tracing::debug!(
                "Dispatching group {}/{} ({} files)",
                index + 1,
                total_groups,
                group.len()
            );

            let tasks = group.iter().map(|file| {
                let span = tracing::info_span!("upload_file", id = %file.id, name = %file.name);
                self.uploader
                    .upload(file, &selection, &ledger)
                    .instrument(span)
            });
            join_all(tasks).await;
        }

        let summary = ledger.summary();
        tracing::info!(
            "🏁 Batch finished: {} completed, {} failed",
            summary.completed,
            summary.failed
        );
        on_complete();
    }
}
