use crate::services::storage::StorageService;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub mod images;
pub mod stats;
pub mod taxonomy;

pub use images::{ImageFilter, ImageWithClassification};
pub use stats::GalleryStats;

/// Admin operations on images, categories and tags.
pub struct GalleryService {
    db: DatabaseConnection,
    storage: Arc<dyn StorageService>,
}

impl GalleryService {
    pub fn new(db: DatabaseConnection, storage: Arc<dyn StorageService>) -> Self {
        Self { db, storage }
    }
}
