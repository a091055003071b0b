use super::ledger::ProgressLedger;
use super::naming::{derive_stored_reference, derive_title};
use super::types::{ClassificationSelection, FileSubmission, UploadError};
use crate::entities::images;
use crate::services::metadata_store::{MetadataStore, NewImageRecord};
use crate::services::storage::StorageService;
use std::sync::Arc;

const PROGRESS_STARTED: u8 = 10;
const PROGRESS_TRANSFERRING: u8 = 30;
const PROGRESS_PERSISTING: u8 = 70;

/// Runs the two-phase upload of a single file: bytes to content storage,
/// then the image record with its classification links.
pub struct FileUploader {
    storage: Arc<dyn StorageService>,
    metadata: Arc<dyn MetadataStore>,
    storage_prefix: String,
}

impl FileUploader {
    pub fn new(
        storage: Arc<dyn StorageService>,
        metadata: Arc<dyn MetadataStore>,
        storage_prefix: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            metadata,
            storage_prefix: storage_prefix.into(),
        }
    }

    /// Uploads `file` and records every outcome in `ledger`. Never fails.
    pub async fn upload(
        &self,
        file: &FileSubmission,
        selection: &ClassificationSelection,
        ledger: &ProgressLedger,
    ) {
        match self.try_upload(file, selection, ledger).await {
            Ok(image) => {
                ledger.mark_completed(&file.id);
                tracing::info!("✅ Uploaded {} as image {}", file.name, image.id);
            }
            Err(e) => {
                let message = e.ledger_message();
                tracing::warn!("❌ Upload of {} failed: {}", file.name, message);
                ledger.mark_failed(&file.id, message);
            }
        }
    }

    async fn try_upload(
        &self,
        file: &FileSubmission,
        selection: &ClassificationSelection,
        ledger: &ProgressLedger,
    ) -> Result<images::Model, UploadError> {
        ledger.mark_uploading(&file.id, PROGRESS_STARTED);

        let stored_reference = derive_stored_reference(&self.storage_prefix, &file.name);

        ledger.mark_uploading(&file.id, PROGRESS_TRANSFERRING);
        self.storage
            .upload_file(&stored_reference, file.bytes.clone())
            .await
            .map_err(|e| UploadError::Transfer(e.to_string()))?;

        ledger.mark_uploading(&file.id, PROGRESS_PERSISTING);
        // A failure here leaves the stored object unreferenced; the
        // reconciler removes it once the grace period has passed.
        self.metadata
            .create_record(NewImageRecord {
                title: derive_title(&file.name),
                description: String::new(),
                stored_reference,
                category_ids: selection.category_ids.clone(),
                tag_ids: selection.tag_ids.clone(),
            })
            .await
            .map_err(|e| UploadError::Persistence(e.to_string()))
    }
}
