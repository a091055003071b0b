pub use super::categories::Entity as Categories;
pub use super::image_categories::Entity as ImageCategories;
pub use super::image_tags::Entity as ImageTags;
pub use super::images::Entity as Images;
pub use super::tags::Entity as Tags;
