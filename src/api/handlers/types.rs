use crate::entities::{categories, tags};
use crate::services::gallery_service::{GalleryStats, ImageWithClassification};
use crate::services::upload::{FileStatus, LedgerSummary, UploadStage};
use crate::services::upload_service::UploadBatch;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Serialize, ToSchema)]
pub struct UploadAcceptedResponse {
    pub batch_id: String,
    pub total_files: usize,
    pub groups: usize,
}

#[derive(Serialize, ToSchema)]
pub struct FileProgressEntry {
    pub id: String,
    pub name: String,
    pub stage: UploadStage,
    pub progress: u8,
    pub error: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct BatchProgressResponse {
    pub batch_id: String,
    pub completed: bool,
    pub cancelled: bool,
    pub submitted_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub summary: LedgerSummary,
    pub files: Vec<FileProgressEntry>,
}

impl From<&UploadBatch> for BatchProgressResponse {
    fn from(batch: &UploadBatch) -> Self {
        let files = batch
            .ledger
            .snapshot()
            .into_iter()
            .map(|(id, status): (_, FileStatus)| FileProgressEntry {
                id: id.to_string(),
                name: status.name,
                stage: status.stage,
                progress: status.progress,
                error: status.error,
            })
            .collect();

        Self {
            batch_id: batch.id.to_string(),
            completed: batch.is_completed(),
            cancelled: batch.is_cancelled(),
            submitted_at: batch.submitted_at,
            finished_at: batch.finished_at(),
            summary: batch.ledger.summary(),
            files,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Clone)]
pub struct NamedRef {
    pub id: String,
    pub name: String,
}

impl From<categories::Model> for NamedRef {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

impl From<tags::Model> for NamedRef {
    fn from(model: tags::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ImageResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub path: String,
    /// Relative URL serving the stored bytes
    pub content_url: String,
    pub created_at: DateTime<Utc>,
    pub categories: Vec<NamedRef>,
    pub tags: Vec<NamedRef>,
}

impl From<ImageWithClassification> for ImageResponse {
    fn from(item: ImageWithClassification) -> Self {
        Self {
            content_url: format!("/images/{}/content", item.image.id),
            id: item.image.id,
            title: item.image.title,
            description: item.image.description,
            path: item.image.path,
            created_at: item.image.created_at,
            categories: item.categories.into_iter().map(NamedRef::from).collect(),
            tags: item.tags.into_iter().map(NamedRef::from).collect(),
        }
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListImagesQuery {
    /// Case-insensitive match on title or description
    pub search: Option<String>,
    /// Category id
    pub category: Option<String>,
    /// Tag id
    pub tag: Option<String>,
}

#[derive(Deserialize, ToSchema, Validate)]
pub struct UpdateImageRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,
    #[validate(length(max = 5000, message = "Description is too long"))]
    pub description: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ClassificationRequest {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize, ToSchema, Validate)]
pub struct NameRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
}

#[derive(Serialize, ToSchema)]
pub struct StatsResponse {
    pub images: u64,
    pub categories: u64,
    pub tags: u64,
}

impl From<GalleryStats> for StatsResponse {
    fn from(stats: GalleryStats) -> Self {
        Self {
            images: stats.images,
            categories: stats.categories,
            tags: stats.tags,
        }
    }
}
