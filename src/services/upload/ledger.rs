use super::types::{FileStatus, FileSubmission, UploadStage};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Per-file progress of one batch, keyed by submission id.
///
/// Each entry is written by exactly one upload task, so a write only holds
/// the entry's shard for the assignment itself. Cloning shares the same map.
#[derive(Debug, Clone, Default)]
pub struct ProgressLedger {
    inner: Arc<LedgerInner>,
}

#[derive(Debug, Default)]
struct LedgerInner {
    entries: DashMap<Uuid, FileStatus>,
    order: Vec<Uuid>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct LedgerSummary {
    pub total: usize,
    pub pending: usize,
    pub uploading: usize,
    pub completed: usize,
    pub failed: usize,
}

impl ProgressLedger {
    /// Creates a ledger with every submission `Pending` at 0%.
    pub fn for_submissions(files: &[FileSubmission]) -> Self {
        let entries = DashMap::with_capacity(files.len());
        let mut order = Vec::with_capacity(files.len());
        for file in files {
            entries.insert(file.id, FileStatus::pending(file.name.clone()));
            order.push(file.id);
        }
        Self {
            inner: Arc::new(LedgerInner { entries, order }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.order.is_empty()
    }

    pub fn get(&self, id: &Uuid) -> Option<FileStatus> {
        self.inner.entries.get(id).map(|entry| entry.value().clone())
    }

    /// First entry whose display name matches.
    pub fn find_by_name(&self, name: &str) -> Option<(Uuid, FileStatus)> {
        self.snapshot()
            .into_iter()
            .find(|(_, status)| status.name == name)
    }

    /// All entries in submission order.
    pub fn snapshot(&self) -> Vec<(Uuid, FileStatus)> {
        self.inner
            .order
            .iter()
            .filter_map(|id| self.get(id).map(|status| (*id, status)))
            .collect()
    }

    pub fn summary(&self) -> LedgerSummary {
        let mut summary = LedgerSummary {
            total: self.len(),
            ..Default::default()
        };
        for entry in self.inner.entries.iter() {
            match entry.stage {
                UploadStage::Pending => summary.pending += 1,
                UploadStage::Uploading => summary.uploading += 1,
                UploadStage::Completed => summary.completed += 1,
                UploadStage::Failed => summary.failed += 1,
            }
        }
        summary
    }

    /// True once every entry reached `Completed` or `Failed`.
    pub fn is_settled(&self) -> bool {
        self.inner
            .entries
            .iter()
            .all(|entry| entry.stage.is_terminal())
    }

    pub fn mark_uploading(&self, id: &Uuid, progress: u8) -> bool {
        self.apply(id, UploadStage::Uploading, Some(progress), None)
    }

    pub fn mark_completed(&self, id: &Uuid) -> bool {
        self.apply(id, UploadStage::Completed, Some(100), None)
    }

    /// Fails the entry, keeping its last known progress.
    pub fn mark_failed(&self, id: &Uuid, message: impl Into<String>) -> bool {
        self.apply(id, UploadStage::Failed, None, Some(message.into()))
    }

    fn apply(
        &self,
        id: &Uuid,
        stage: UploadStage,
        progress: Option<u8>,
        error: Option<String>,
    ) -> bool {
        let Some(mut entry) = self.inner.entries.get_mut(id) else {
            tracing::warn!("Ledger update for unknown submission {}", id);
            return false;
        };

        let status = entry.value_mut();
        if !status.stage.can_advance_to(stage) {
            tracing::warn!(
                "Rejected ledger transition {:?} -> {:?} for {}",
                status.stage,
                stage,
                status.name
            );
            return false;
        }

        let progress = progress.map(|p| p.min(100)).unwrap_or(status.progress);
        if progress < status.progress {
            tracing::warn!(
                "Rejected progress regression {} -> {} for {}",
                status.progress,
                progress,
                status.name
            );
            return false;
        }

        status.stage = stage;
        status.progress = progress;
        if error.is_some() {
            status.error = error;
        }
        true
    }
}
