use crate::api::error::AppError;
use crate::config::GalleryConfig;
use crate::services::metadata_store::MetadataStore;
use crate::services::storage::StorageService;
use crate::services::upload::{
    BatchScheduler, ClassificationSelection, FileSubmission, FileUploader, ProgressLedger,
};
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// A submitted batch: its ledger, cancellation handle and completion flag.
pub struct UploadBatch {
    pub id: Uuid,
    pub ledger: ProgressLedger,
    pub group_count: usize,
    pub submitted_at: DateTime<Utc>,
    cancel: CancellationToken,
    finished: watch::Receiver<Option<DateTime<Utc>>>,
}

impl UploadBatch {
    pub fn is_completed(&self) -> bool {
        self.finished.borrow().is_some()
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        *self.finished.borrow()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stops dispatching further groups; the group in flight still settles.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Resolves once the completion signal for this batch has fired.
    pub async fn wait(&self) {
        let mut finished = self.finished.clone();
        let _ = finished.wait_for(|at| at.is_some()).await;
    }
}

/// Accepts upload submissions and runs each batch in the background.
pub struct UploadService {
    scheduler: Arc<BatchScheduler>,
    config: GalleryConfig,
    batches: DashMap<Uuid, Arc<UploadBatch>>,
}

impl UploadService {
    pub fn new(
        storage: Arc<dyn StorageService>,
        metadata: Arc<dyn MetadataStore>,
        config: GalleryConfig,
    ) -> anyhow::Result<Self> {
        let batch_width = NonZeroUsize::new(config.batch_width)
            .ok_or_else(|| anyhow!("Upload batch width must be positive"))?;
        let uploader = Arc::new(FileUploader::new(
            storage,
            metadata,
            config.storage_prefix.clone(),
        ));

        Ok(Self {
            scheduler: Arc::new(BatchScheduler::new(uploader, batch_width)),
            config,
            batches: DashMap::new(),
        })
    }

    /// Accepts `files` for upload and returns immediately.
    ///
    /// `selection` is frozen here; edits made after submission never reach
    /// this batch. An empty submission completes at once.
    pub fn submit(
        &self,
        files: Vec<FileSubmission>,
        selection: ClassificationSelection,
    ) -> Result<Arc<UploadBatch>, AppError> {
        if files.len() > self.config.max_files_per_batch {
            return Err(AppError::BadRequest(format!(
                "Too many files: {} (max {})",
                files.len(),
                self.config.max_files_per_batch
            )));
        }
        if let Some(file) = files
            .iter()
            .find(|f| f.bytes.len() > self.config.max_file_size)
        {
            return Err(AppError::PayloadTooLarge(format!(
                "{} exceeds the maximum file size of {} bytes",
                file.name, self.config.max_file_size
            )));
        }

        self.prune_finished();

        let ledger = ProgressLedger::for_submissions(&files);
        let cancel = CancellationToken::new();
        let (finished_tx, finished_rx) = watch::channel(None);

        let batch = Arc::new(UploadBatch {
            id: Uuid::new_v4(),
            ledger: ledger.clone(),
            group_count: self.scheduler.group_count(files.len()),
            submitted_at: Utc::now(),
            cancel: cancel.clone(),
            finished: finished_rx,
        });
        self.batches.insert(batch.id, batch.clone());

        tracing::info!(
            "📥 Accepted upload batch {} ({} files, {} groups)",
            batch.id,
            files.len(),
            batch.group_count
        );

        let scheduler = self.scheduler.clone();
        let selection = Arc::new(selection);
        let batch_id = batch.id;
        tokio::spawn(async move {
            scheduler
                .run(files, selection, ledger, cancel, move || {
                    let _ = finished_tx.send(Some(Utc::now()));
                    tracing::debug!("Completion signalled for batch {}", batch_id);
                })
                .await;
        });

        Ok(batch)
    }

    pub fn get(&self, batch_id: &Uuid) -> Option<Arc<UploadBatch>> {
        self.batches.get(batch_id).map(|entry| entry.value().clone())
    }

    /// Batches whose completion signal has not fired yet.
    pub fn active_batches(&self) -> usize {
        self.batches
            .iter()
            .filter(|entry| !entry.value().is_completed())
            .count()
    }

    /// Returns false when the batch is unknown.
    pub fn cancel(&self, batch_id: &Uuid) -> bool {
        match self.get(batch_id) {
            Some(batch) => {
                tracing::info!("🛑 Cancelling upload batch {}", batch_id);
                batch.cancel();
                true
            }
            None => false,
        }
    }

    /// Drops finished batches older than the configured TTL.
    ///
    /// A TTL reaching past the representable time range keeps every batch.
    pub fn prune_finished(&self) -> usize {
        let Some(cutoff) = i64::try_from(self.config.finished_batch_ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .and_then(|ttl| Utc::now().checked_sub_signed(ttl))
        else {
            return 0;
        };
        let before = self.batches.len();
        self.batches
            .retain(|_, batch| batch.finished_at().is_none_or(|at| at > cutoff));
        let pruned = before.saturating_sub(self.batches.len());
        if pruned > 0 {
            tracing::debug!("Pruned {} finished upload batches", pruned);
        }
        pruned
    }
}
