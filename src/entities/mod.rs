pub mod prelude;

pub mod categories;
pub mod image_categories;
pub mod image_tags;
pub mod images;
pub mod tags;
