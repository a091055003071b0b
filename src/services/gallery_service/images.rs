use crate::api::error::AppError;
use bytes::Bytes;
use crate::entities::{categories, image_categories, image_tags, images, prelude::*, tags};
use sea_orm::sea_query::{Expr, Func, LikeExpr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, LoaderTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use super::GalleryService;

#[derive(Debug, Default, Clone)]
pub struct ImageFilter {
    /// Case-insensitive match on title or description
    pub search: Option<String>,
    pub category_id: Option<String>,
    pub tag_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ImageWithClassification {
    pub image: images::Model,
    pub categories: Vec<categories::Model>,
    pub tags: Vec<tags::Model>,
}

const LIKE_ESCAPE: char = '!';

/// Search text matches literally; `%` and `_` are not wildcards.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, LIKE_ESCAPE | '%' | '_') {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

impl GalleryService {
    pub async fn list_images(
        &self,
        filter: ImageFilter,
    ) -> Result<Vec<ImageWithClassification>, AppError> {
        let mut query = Images::find().order_by_desc(images::Column::CreatedAt);

        if let Some(search) = filter.search.filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", escape_like(&search.trim().to_lowercase()));
            query = query.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(images::Column::Title)))
                            .like(LikeExpr::new(pattern.clone()).escape(LIKE_ESCAPE)),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(images::Column::Description)))
                            .like(LikeExpr::new(pattern).escape(LIKE_ESCAPE)),
                    ),
            );
        }

        if let Some(category_id) = filter.category_id.filter(|s| !s.is_empty()) {
            query = query.filter(
                images::Column::Id.in_subquery(
                    Query::select()
                        .column(image_categories::Column::ImageId)
                        .from(ImageCategories)
                        .and_where(image_categories::Column::CategoryId.eq(category_id))
                        .to_owned(),
                ),
            );
        }

        if let Some(tag_id) = filter.tag_id.filter(|s| !s.is_empty()) {
            query = query.filter(
                images::Column::Id.in_subquery(
                    Query::select()
                        .column(image_tags::Column::ImageId)
                        .from(ImageTags)
                        .and_where(image_tags::Column::TagId.eq(tag_id))
                        .to_owned(),
                ),
            );
        }

        let images = query.all(&self.db).await?;
        let categories = images
            .load_many_to_many(Categories, ImageCategories, &self.db)
            .await?;
        let tags = images.load_many_to_many(Tags, ImageTags, &self.db).await?;

        Ok(images
            .into_iter()
            .zip(categories)
            .zip(tags)
            .map(|((image, categories), tags)| ImageWithClassification {
                image,
                categories,
                tags,
            })
            .collect())
    }

    pub async fn get_image(&self, id: &str) -> Result<ImageWithClassification, AppError> {
        let image = Images::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Image {} not found", id)))?;

        let categories = image.find_related(Categories).all(&self.db).await?;
        let tags = image.find_related(Tags).all(&self.db).await?;

        Ok(ImageWithClassification {
            image,
            categories,
            tags,
        })
    }

    pub async fn update_image(
        &self,
        id: &str,
        title: String,
        description: String,
    ) -> Result<images::Model, AppError> {
        let image = Images::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Image {} not found", id)))?;

        let mut active: images::ActiveModel = image.into();
        active.title = Set(title);
        active.description = Set(description);
        Ok(active.update(&self.db).await?)
    }

    /// Replaces all category and tag links of an image, addressed by name.
    pub async fn set_classification(
        &self,
        id: &str,
        category_names: Vec<String>,
        tag_names: Vec<String>,
    ) -> Result<ImageWithClassification, AppError> {
        let txn = self.db.begin().await?;

        Images::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Image {} not found", id)))?;

        let categories = Categories::find()
            .filter(categories::Column::Name.is_in(category_names.clone()))
            .all(&txn)
            .await?;
        if let Some(missing) = category_names
            .iter()
            .find(|name| !categories.iter().any(|c| &c.name == *name))
        {
            return Err(AppError::BadRequest(format!("Unknown category: {}", missing)));
        }

        let tags = Tags::find()
            .filter(tags::Column::Name.is_in(tag_names.clone()))
            .all(&txn)
            .await?;
        if let Some(missing) = tag_names
            .iter()
            .find(|name| !tags.iter().any(|t| &t.name == *name))
        {
            return Err(AppError::BadRequest(format!("Unknown tag: {}", missing)));
        }

        ImageCategories::delete_many()
            .filter(image_categories::Column::ImageId.eq(id))
            .exec(&txn)
            .await?;
        ImageTags::delete_many()
            .filter(image_tags::Column::ImageId.eq(id))
            .exec(&txn)
            .await?;

        if !categories.is_empty() {
            ImageCategories::insert_many(categories.iter().map(|c| {
                image_categories::ActiveModel {
                    image_id: Set(id.to_string()),
                    category_id: Set(c.id.clone()),
                }
            }))
            .exec_without_returning(&txn)
            .await?;
        }

        if !tags.is_empty() {
            ImageTags::insert_many(tags.iter().map(|t| image_tags::ActiveModel {
                image_id: Set(id.to_string()),
                tag_id: Set(t.id.clone()),
            }))
            .exec_without_returning(&txn)
            .await?;
        }

        txn.commit().await?;

        self.get_image(id).await
    }

    /// Raw stored bytes of an image together with its record.
    pub async fn image_content(&self, id: &str) -> Result<(images::Model, Bytes), AppError> {
        let image = Images::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Image {} not found", id)))?;

        let bytes = self.storage.get_file(&image.path).await.map_err(|e| {
            tracing::error!("Failed to read stored object {}: {}", image.path, e);
            AppError::NotFound(format!("Content of image {} is unavailable", id))
        })?;

        Ok((image, bytes))
    }

    /// Removes the stored bytes first, then the record and its links.
    pub async fn delete_image(&self, id: &str) -> Result<(), AppError> {
        let image = Images::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Image {} not found", id)))?;

        self.storage.delete_file(&image.path).await?;

        let txn = self.db.begin().await?;
        ImageCategories::delete_many()
            .filter(image_categories::Column::ImageId.eq(id))
            .exec(&txn)
            .await?;
        ImageTags::delete_many()
            .filter(image_tags::Column::ImageId.eq(id))
            .exec(&txn)
            .await?;
        image.delete(&txn).await?;
        txn.commit().await?;

        tracing::info!("🗑️  Deleted image {}", id);
        Ok(())
    }
}
