use crate::entities::{image_categories, image_tags, images, prelude::*};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set, TransactionTrait,
};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Fields of an image record created after its bytes were stored.
#[derive(Debug, Clone)]
pub struct NewImageRecord {
    pub title: String,
    pub description: String,
    pub stored_reference: String,
    pub category_ids: Vec<String>,
    pub tag_ids: Vec<String>,
}

/// Metadata persistence used by the upload pipeline.
///
/// `create_record` is atomic: either the image row and all of its
/// category/tag links exist afterwards, or none of them do.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn create_record(&self, record: NewImageRecord) -> Result<images::Model>;
    async fn path_exists(&self, path: &str) -> Result<bool>;
}

pub struct SeaOrmMetadataStore {
    db: DatabaseConnection,
}

impl SeaOrmMetadataStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MetadataStore for SeaOrmMetadataStore {
    async fn create_record(&self, record: NewImageRecord) -> Result<images::Model> {
        let txn = self.db.begin().await?;

        let image = images::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            title: Set(record.title),
            description: Set(record.description),
            path: Set(record.stored_reference),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;

        // Duplicate selections would collide on the composite keys
        let category_links: Vec<_> = record
            .category_ids
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|category_id| image_categories::ActiveModel {
                image_id: Set(image.id.clone()),
                category_id: Set(category_id),
            })
            .collect();

        if !category_links.is_empty() {
            ImageCategories::insert_many(category_links)
                .exec_without_returning(&txn)
                .await?;
        }

        let tag_links: Vec<_> = record
            .tag_ids
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|tag_id| image_tags::ActiveModel {
                image_id: Set(image.id.clone()),
                tag_id: Set(tag_id),
            })
            .collect();

        if !tag_links.is_empty() {
            ImageTags::insert_many(tag_links)
                .exec_without_returning(&txn)
                .await?;
        }

        txn.commit().await?;

        tracing::debug!("Created image record {} for {}", image.id, image.path);
        Ok(image)
    }

    async fn path_exists(&self, path: &str) -> Result<bool> {
        let count = Images::find()
            .filter(images::Column::Path.eq(path))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }
}
