pub mod gallery_service;
pub mod metadata_store;
pub mod reconciler;
pub mod storage;
pub mod upload;
pub mod upload_service;
pub mod worker;
