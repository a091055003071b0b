use std::env;

/// Upper bound for `orphan_grace_hours`; larger values mean "never reconcile".
pub const MAX_ORPHAN_GRACE_HOURS: u64 = 24 * 365 * 100;

/// Upper bound for `finished_batch_ttl_secs`; larger values mean "never prune".
pub const MAX_FINISHED_BATCH_TTL_SECS: u64 = 60 * 60 * 24 * 365 * 100;

/// Runtime configuration for the gallery backend and its upload pipeline
#[derive(Debug, Clone)]
pub struct GalleryConfig {
    /// Number of uploads dispatched together in one group (default: 5)
    pub batch_width: usize,

    /// Maximum size of a single image in bytes (default: 50 MB)
    pub max_file_size: usize,

    /// Maximum size of one multipart upload request in bytes (default: 512 MB)
    pub max_request_size: usize,

    /// Maximum number of files accepted in one submission (default: 500)
    pub max_files_per_batch: usize,

    /// Key prefix for stored image objects (default: "images/")
    pub storage_prefix: String,

    /// Age after which an unreferenced stored object is deleted (default: 24)
    pub orphan_grace_hours: u64,

    /// Interval between reconciliation passes in seconds (default: 3600)
    pub reconcile_interval_secs: u64,

    /// How long a finished batch stays queryable in seconds (default: 3600)
    pub finished_batch_ttl_secs: u64,

    /// Allowed CORS Origins (comma separated)
    pub allowed_origins: Vec<String>,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            batch_width: 5,
            max_file_size: 50 * 1024 * 1024, // 50 MB
            max_request_size: 512 * 1024 * 1024, // 512 MB
            max_files_per_batch: 500,
            storage_prefix: "images/".to_string(),
            orphan_grace_hours: 24,
            reconcile_interval_secs: 3600,
            finished_batch_ttl_secs: 3600,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl GalleryConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            batch_width: env::var("UPLOAD_BATCH_WIDTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|w: &usize| *w > 0)
                .unwrap_or(default.batch_width),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            max_request_size: env::var("MAX_REQUEST_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_request_size),

            max_files_per_batch: env::var("MAX_FILES_PER_BATCH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_files_per_batch),

            storage_prefix: env::var("STORAGE_PREFIX").unwrap_or(default.storage_prefix),

            orphan_grace_hours: env::var("ORPHAN_GRACE_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.orphan_grace_hours)
                .min(MAX_ORPHAN_GRACE_HOURS),

            reconcile_interval_secs: env::var("RECONCILE_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.reconcile_interval_secs),

            finished_batch_ttl_secs: env::var("FINISHED_BATCH_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.finished_batch_ttl_secs)
                .min(MAX_FINISHED_BATCH_TTL_SECS),

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(default.allowed_origins),
        }
    }

    /// Create config for development (small groups, fast reconciliation)
    pub fn development() -> Self {
        Self {
            batch_width: 5,
            max_file_size: 50 * 1024 * 1024,
            max_request_size: 1024 * 1024 * 1024,
            max_files_per_batch: 1000,
            storage_prefix: "images/".to_string(),
            orphan_grace_hours: 1,
            reconcile_interval_secs: 300,
            finished_batch_ttl_secs: 600,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(), // Vite default
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }

    /// Create config for production (env overrides on top of strict defaults)
    pub fn production() -> Self {
        let from_env = Self::from_env();
        Self {
            orphan_grace_hours: from_env.orphan_grace_hours.max(24),
            ..from_env
        }
    }
}
