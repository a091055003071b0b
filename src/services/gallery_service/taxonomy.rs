use crate::api::error::AppError;
use crate::entities::{categories, prelude::*, tags};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::GalleryService;

fn normalize_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name must not be empty".to_string()));
    }
    Ok(name.to_string())
}

impl GalleryService {
    pub async fn list_categories(&self) -> Result<Vec<categories::Model>, AppError> {
        Ok(Categories::find()
            .order_by_asc(categories::Column::Name)
            .all(&self.db)
            .await?)
    }

    pub async fn create_category(&self, name: &str) -> Result<categories::Model, AppError> {
        let name = normalize_name(name)?;
        self.ensure_category_name_free(&name).await?;

        let category = categories::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            name: Set(name),
        }
        .insert(&self.db)
        .await?;

        tracing::info!("Created category {} ({})", category.name, category.id);
        Ok(category)
    }

    pub async fn rename_category(
        &self,
        id: &str,
        name: &str,
    ) -> Result<categories::Model, AppError> {
        let name = normalize_name(name)?;
        let category = Categories::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))?;

        if category.name == name {
            return Ok(category);
        }
        self.ensure_category_name_free(&name).await?;

        let mut active: categories::ActiveModel = category.into();
        active.name = Set(name);
        Ok(active.update(&self.db).await?)
    }

    /// Deleting a category unlinks it from every image.
    pub async fn delete_category(&self, id: &str) -> Result<(), AppError> {
        let category = Categories::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))?;

        ImageCategories::delete_many()
            .filter(crate::entities::image_categories::Column::CategoryId.eq(id))
            .exec(&self.db)
            .await?;
        category.delete(&self.db).await?;
        Ok(())
    }

    async fn ensure_category_name_free(&self, name: &str) -> Result<(), AppError> {
        let taken = Categories::find()
            .filter(categories::Column::Name.eq(name))
            .count(&self.db)
            .await?;
        if taken > 0 {
            return Err(AppError::Conflict(format!(
                "Category '{}' already exists",
                name
            )));
        }
        Ok(())
    }

    pub async fn list_tags(&self) -> Result<Vec<tags::Model>, AppError> {
        Ok(Tags::find()
            .order_by_asc(tags::Column::Name)
            .all(&self.db)
            .await?)
    }

    pub async fn create_tag(&self, name: &str) -> Result<tags::Model, AppError> {
        let name = normalize_name(name)?;
        self.ensure_tag_name_free(&name).await?;

        let tag = tags::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            name: Set(name),
        }
        .insert(&self.db)
        .await?;

        tracing::info!("Created tag {} ({})", tag.name, tag.id);
        Ok(tag)
    }

    pub async fn rename_tag(&self, id: &str, name: &str) -> Result<tags::Model, AppError> {
        let name = normalize_name(name)?;
        let tag = Tags::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tag {} not found", id)))?;

        if tag.name == name {
            return Ok(tag);
        }
        self.ensure_tag_name_free(&name).await?;

        let mut active: tags::ActiveModel = tag.into();
        active.name = Set(name);
        Ok(active.update(&self.db).await?)
    }

    pub async fn delete_tag(&self, id: &str) -> Result<(), AppError> {
        let tag = Tags::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tag {} not found", id)))?;

        ImageTags::delete_many()
            .filter(crate::entities::image_tags::Column::TagId.eq(id))
            .exec(&self.db)
            .await?;
        tag.delete(&self.db).await?;
        Ok(())
    }

    async fn ensure_tag_name_free(&self, name: &str) -> Result<(), AppError> {
        let taken = Tags::find()
            .filter(tags::Column::Name.eq(name))
            .count(&self.db)
            .await?;
        if taken > 0 {
            return Err(AppError::Conflict(format!("Tag '{}' already exists", name)));
        }
        Ok(())
    }
}
