use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "images")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    /// Stored object reference in content storage
    #[sea_orm(unique)]
    pub path: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::image_categories::Entity")]
    ImageCategories,
    #[sea_orm(has_many = "super::image_tags::Entity")]
    ImageTags,
}

impl Related<super::image_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ImageCategories.def()
    }
}

impl Related<super::image_tags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ImageTags.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        super::image_categories::Relation::Categories.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::image_categories::Relation::Images.def().rev())
    }
}

impl Related<super::tags::Entity> for Entity {
    fn to() -> RelationDef {
        super::image_tags::Relation::Tags.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::image_tags::Relation::Images.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
