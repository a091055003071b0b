use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle stage of a single file in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UploadStage {
    Pending,
    Uploading,
    Completed,
    Failed,
}

impl UploadStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, UploadStage::Completed | UploadStage::Failed)
    }

    fn rank(self) -> u8 {
        match self {
            UploadStage::Pending => 0,
            UploadStage::Uploading => 1,
            UploadStage::Completed | UploadStage::Failed => 2,
        }
    }

    /// Whether a record may move from `self` to `next`.
    ///
    /// `Pending -> Failed` is allowed for files that were never dispatched;
    /// `Pending -> Completed` is not, since completion implies remote calls.
    pub fn can_advance_to(self, next: UploadStage) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (UploadStage::Pending, UploadStage::Completed) => false,
            _ => next.rank() >= self.rank(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FileStatus {
    pub name: String,
    pub stage: UploadStage,
    pub progress: u8,
    pub error: Option<String>,
}

impl FileStatus {
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stage: UploadStage::Pending,
            progress: 0,
            error: None,
        }
    }
}

/// A file accepted into a batch. Immutable once created.
#[derive(Debug, Clone)]
pub struct FileSubmission {
    pub id: Uuid,
    pub name: String,
    pub bytes: Bytes,
}

impl FileSubmission {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Category and tag ids chosen once for a whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ClassificationSelection {
    pub category_ids: Vec<String>,
    pub tag_ids: Vec<String>,
}

#[derive(Error, Debug)]
pub enum UploadError {
    /// Content storage rejected or could not complete the byte upload
    #[error("{0}")]
    Transfer(String),

    /// Metadata record creation failed after the bytes were stored
    #[error("{0}")]
    Persistence(String),

    #[error("Upload cancelled")]
    Cancelled,
}

impl UploadError {
    /// Message recorded in the progress ledger.
    pub fn ledger_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            "Unknown error".to_string()
        } else {
            message
        }
    }
}
