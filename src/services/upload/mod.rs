pub mod ledger;
pub mod naming;
pub mod scheduler;
pub mod task;
pub mod types;

pub use ledger::{LedgerSummary, ProgressLedger};
pub use scheduler::BatchScheduler;
pub use task::FileUploader;
pub use types::{ClassificationSelection, FileStatus, FileSubmission, UploadError, UploadStage};
