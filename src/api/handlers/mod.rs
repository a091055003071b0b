pub mod health;
pub mod images;
pub mod stats;
pub mod taxonomy;
pub mod types;
pub mod uploads;
