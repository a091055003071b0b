use crate::api::error::AppError;
use crate::entities::prelude::*;
use sea_orm::{EntityTrait, PaginatorTrait};

use super::GalleryService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GalleryStats {
    pub images: u64,
    pub categories: u64,
    pub tags: u64,
}

impl GalleryService {
    /// Totals shown on the admin dashboard.
    pub async fn stats(&self) -> Result<GalleryStats, AppError> {
        Ok(GalleryStats {
            images: Images::find().count(&self.db).await?,
            categories: Categories::find().count(&self.db).await?,
            tags: Tags::find().count(&self.db).await?,
        })
    }
}
