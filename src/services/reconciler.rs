use crate::services::metadata_store::MetadataStore;
use crate::services::storage::StorageService;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Deletes stored image objects that no image record references.
///
/// Uploads store bytes before creating the record, so a fresh object without
/// a record may still be mid-upload. Only objects older than the grace period
/// are considered orphans.
pub struct OrphanReconciler {
    storage: Arc<dyn StorageService>,
    metadata: Arc<dyn MetadataStore>,
    prefix: String,
    grace_hours: u64,
}

impl OrphanReconciler {
    pub fn new(
        storage: Arc<dyn StorageService>,
        metadata: Arc<dyn MetadataStore>,
        prefix: impl Into<String>,
        grace_hours: u64,
    ) -> Self {
        Self {
            storage,
            metadata,
            prefix: prefix.into(),
            grace_hours,
        }
    }

    /// Objects modified before this instant are old enough to delete.
    fn cutoff(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.grace_hours)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|grace| Utc::now().checked_sub_signed(grace))
    }

    /// Runs one pass and returns the number of deleted objects.
    pub async fn reconcile(&self) -> Result<usize> {
        let Some(cutoff) = self.cutoff() else {
            tracing::debug!(
                "Grace period of {}h predates any object, skipping reconciliation",
                self.grace_hours
            );
            return Ok(0);
        };
        let keys = self.storage.list_objects(&self.prefix).await?;
        let mut deleted = 0;

        for key in keys {
            if self.metadata.path_exists(&key).await? {
                continue;
            }

            let meta = match self.storage.get_object_metadata(&key).await {
                Ok(meta) => meta,
                Err(e) => {
                    tracing::warn!("Could not inspect stored object {}: {}", key, e);
                    continue;
                }
            };

            match meta.last_modified {
                Some(modified) if modified < cutoff => {}
                _ => continue,
            }

            match self.storage.delete_file(&key).await {
                Ok(()) => {
                    tracing::info!("🧹 Deleted orphaned object {} ({} bytes)", key, meta.size);
                    deleted += 1;
                }
                Err(e) => tracing::error!("Failed to delete orphaned object {}: {}", key, e),
            }
        }

        Ok(deleted)
    }
}
