mod common;

use chrono::Duration;
use common::{MockMetadataStore, MockStorageService};
use rust_gallery_backend::services::metadata_store::{MetadataStore, NewImageRecord};
use rust_gallery_backend::services::reconciler::OrphanReconciler;
use std::sync::Arc;

#[tokio::test]
async fn test_reconcile_removes_only_old_orphans() {
    let storage = Arc::new(MockStorageService::new());
    let metadata = Arc::new(MockMetadataStore::new());

    metadata
        .create_record(NewImageRecord {
            title: "kept".to_string(),
            description: String::new(),
            stored_reference: "images/kept.png".to_string(),
            category_ids: vec![],
            tag_ids: vec![],
        })
        .await
        .unwrap();

    storage.put_with_age("images/kept.png", Duration::hours(48));
    storage.put_with_age("images/old-orphan.png", Duration::hours(48));
    storage.put_with_age("images/fresh-orphan.png", Duration::minutes(5));
    storage.put_with_age("thumbnails/old.png", Duration::hours(48));

    let reconciler = OrphanReconciler::new(storage.clone(), metadata, "images/", 24);
    let deleted = reconciler.reconcile().await.unwrap();

    assert_eq!(deleted, 1);
    assert!(storage.contains("images/kept.png"));
    assert!(!storage.contains("images/old-orphan.png"));
    // Still inside the grace period
    assert!(storage.contains("images/fresh-orphan.png"));
    // Outside the managed prefix
    assert!(storage.contains("thumbnails/old.png"));
}

#[tokio::test]
async fn test_reconcile_empty_store() {
    let storage = Arc::new(MockStorageService::new());
    let metadata = Arc::new(MockMetadataStore::new());
    let reconciler = OrphanReconciler::new(storage, metadata, "images/", 24);
    assert_eq!(reconciler.reconcile().await.unwrap(), 0);
}

#[tokio::test]
async fn test_huge_grace_period_deletes_nothing() {
    let storage = Arc::new(MockStorageService::new());
    let metadata = Arc::new(MockMetadataStore::new());
    storage.put_with_age("images/ancient-orphan.png", Duration::days(3650));

    let reconciler = OrphanReconciler::new(storage.clone(), metadata, "images/", u64::MAX);
    assert_eq!(reconciler.reconcile().await.unwrap(), 0);
    assert!(storage.contains("images/ancient-orphan.png"));
}
