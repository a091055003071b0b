mod common;

use bytes::Bytes;
use common::{MockMetadataStore, MockStorageService};
use rust_gallery_backend::config::GalleryConfig;
use rust_gallery_backend::services::upload::{
    BatchScheduler, ClassificationSelection, FileSubmission, FileUploader, ProgressLedger,
    UploadStage,
};
use rust_gallery_backend::services::upload_service::UploadService;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

fn named_files(names: &[&str]) -> Vec<FileSubmission> {
    names
        .iter()
        .map(|name| FileSubmission::new(*name, Bytes::copy_from_slice(name.as_bytes())))
        .collect()
}

fn numbered_files(count: usize) -> Vec<FileSubmission> {
    (0..count)
        .map(|i| {
            let name = format!("img{:02}.png", i);
            let bytes = Bytes::from(name.clone().into_bytes());
            FileSubmission::new(name, bytes)
        })
        .collect()
}

fn scheduler(
    storage: Arc<MockStorageService>,
    metadata: Arc<MockMetadataStore>,
    width: usize,
) -> BatchScheduler {
    let uploader = Arc::new(FileUploader::new(storage, metadata, "images/"));
    BatchScheduler::new(uploader, NonZeroUsize::new(width).unwrap())
}

async fn run_batch(
    scheduler: &BatchScheduler,
    files: Vec<FileSubmission>,
    selection: ClassificationSelection,
    cancel: CancellationToken,
) -> (ProgressLedger, usize) {
    let ledger = ProgressLedger::for_submissions(&files);
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    scheduler
        .run(files, Arc::new(selection), ledger.clone(), cancel, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .await;
    (ledger, calls.load(Ordering::SeqCst))
}

#[tokio::test]
async fn test_seven_files_run_in_two_groups() {
    let storage = Arc::new(MockStorageService::with_delay(20));
    let metadata = Arc::new(MockMetadataStore::new());
    let scheduler = scheduler(storage.clone(), metadata.clone(), 5);

    assert_eq!(scheduler.group_count(7), 2);

    let (ledger, calls) = run_batch(
        &scheduler,
        numbered_files(7),
        ClassificationSelection::default(),
        CancellationToken::new(),
    )
    .await;

    assert_eq!(calls, 1);
    assert_eq!(storage.max_in_flight(), 5);
    assert_eq!(ledger.summary().completed, 7);
    for (_, status) in ledger.snapshot() {
        assert_eq!(status.stage, UploadStage::Completed);
        assert_eq!(status.progress, 100);
        assert!(status.error.is_none());
    }
    assert_eq!(metadata.records.lock().unwrap().len(), 7);
}

#[tokio::test]
async fn test_in_flight_never_exceeds_batch_width() {
    for (count, width) in [(1, 1), (4, 1), (12, 5), (10, 10), (3, 8)] {
        let storage = Arc::new(MockStorageService::with_delay(10));
        let metadata = Arc::new(MockMetadataStore::new());
        let scheduler = scheduler(storage.clone(), metadata, width);

        let (ledger, calls) = run_batch(
            &scheduler,
            numbered_files(count),
            ClassificationSelection::default(),
            CancellationToken::new(),
        )
        .await;

        assert_eq!(calls, 1);
        assert!(storage.max_in_flight() <= width);
        assert_eq!(storage.upload_count(), count);
        assert_eq!(scheduler.group_count(count), count.div_ceil(width));
        assert!(ledger.is_settled());
    }
}

#[tokio::test]
async fn test_groups_run_in_submission_order() {
    let storage = Arc::new(MockStorageService::with_delay(15));
    let metadata = Arc::new(MockMetadataStore::new());
    let scheduler = scheduler(storage.clone(), metadata, 3);

    let files = numbered_files(8);
    let names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();
    run_batch(
        &scheduler,
        files,
        ClassificationSelection::default(),
        CancellationToken::new(),
    )
    .await;

    let events = storage.events.lock().unwrap().clone();
    let position = |event: String| events.iter().position(|e| *e == event).unwrap();

    let groups: Vec<&[String]> = names.chunks(3).collect();
    for pair in groups.windows(2) {
        let last_end = pair[0]
            .iter()
            .map(|n| position(format!("end:{}", n)))
            .max()
            .unwrap();
        let first_start = pair[1]
            .iter()
            .map(|n| position(format!("start:{}", n)))
            .min()
            .unwrap();
        assert!(
            last_end < first_start,
            "a later group started before the previous one settled"
        );
    }
}

#[tokio::test]
async fn test_transfer_failure_is_isolated() {
    let storage = Arc::new(MockStorageService::with_delay(5));
    storage.fail_on("b.png");
    let metadata = Arc::new(MockMetadataStore::new());
    let scheduler = scheduler(storage.clone(), metadata.clone(), 2);

    let (ledger, calls) = run_batch(
        &scheduler,
        named_files(&["a.png", "b.png", "c.png", "d.png"]),
        ClassificationSelection::default(),
        CancellationToken::new(),
    )
    .await;

    assert_eq!(calls, 1);
    let (_, failed) = ledger.find_by_name("b.png").unwrap();
    assert_eq!(failed.stage, UploadStage::Failed);
    assert_eq!(failed.progress, 30);
    assert_eq!(failed.error.as_deref(), Some("storage unavailable"));

    for name in ["a.png", "c.png", "d.png"] {
        let (_, status) = ledger.find_by_name(name).unwrap();
        assert_eq!(status.stage, UploadStage::Completed, "{} should complete", name);
    }

    // The next group still ran after the failure
    assert_eq!(storage.upload_count(), 4);
    assert_eq!(metadata.records.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_persistence_failure_leaves_object_unreferenced() {
    let storage = Arc::new(MockStorageService::new());
    let metadata = Arc::new(MockMetadataStore::new());
    metadata.fail_on_title("broken");
    let scheduler = scheduler(storage.clone(), metadata.clone(), 5);

    let (ledger, _) = run_batch(
        &scheduler,
        named_files(&["ok.jpg", "broken.jpg"]),
        ClassificationSelection::default(),
        CancellationToken::new(),
    )
    .await;

    let (_, status) = ledger.find_by_name("broken.jpg").unwrap();
    assert_eq!(status.stage, UploadStage::Failed);
    assert_eq!(status.progress, 70);
    assert_eq!(status.error.as_deref(), Some("database is locked"));

    let stored = storage.keys();
    let referenced = metadata.paths();
    assert_eq!(stored.len(), 2);
    assert_eq!(referenced.len(), 1);
    assert_eq!(
        stored.iter().filter(|k| !referenced.contains(k)).count(),
        1,
        "exactly one stored object has no record"
    );
}

#[tokio::test]
async fn test_selection_applied_to_every_record() {
    let storage = Arc::new(MockStorageService::new());
    let metadata = Arc::new(MockMetadataStore::new());
    let scheduler = scheduler(storage, metadata.clone(), 2);

    let selection = ClassificationSelection {
        category_ids: vec!["cat-1".to_string()],
        tag_ids: vec!["tag-1".to_string(), "tag-2".to_string()],
    };
    run_batch(
        &scheduler,
        named_files(&["one.png", "two.png", "three.png"]),
        selection.clone(),
        CancellationToken::new(),
    )
    .await;

    let records = metadata.records.lock().unwrap();
    assert_eq!(records.len(), 3);
    for record in records.iter() {
        assert_eq!(record.category_ids, selection.category_ids);
        assert_eq!(record.tag_ids, selection.tag_ids);
        assert!(record.description.is_empty());
        assert!(record.stored_reference.starts_with("images/"));
        assert!(record.stored_reference.ends_with(".png"));
    }
    let titles: Vec<_> = records.iter().map(|r| r.title.as_str()).collect();
    for title in ["one", "two", "three"] {
        assert!(titles.contains(&title));
    }
}

#[tokio::test]
async fn test_resubmitting_same_name_gets_new_reference() {
    let storage = Arc::new(MockStorageService::new());
    let metadata = Arc::new(MockMetadataStore::new());
    let scheduler = scheduler(storage.clone(), metadata.clone(), 5);

    let first = named_files(&["cat.png"]);
    let second = named_files(&["cat.png"]);
    assert_ne!(first[0].id, second[0].id);

    run_batch(
        &scheduler,
        first,
        ClassificationSelection::default(),
        CancellationToken::new(),
    )
    .await;
    run_batch(
        &scheduler,
        second,
        ClassificationSelection::default(),
        CancellationToken::new(),
    )
    .await;

    let paths = metadata.paths();
    assert_eq!(paths.len(), 2);
    assert_ne!(paths[0], paths[1]);
    assert_eq!(storage.keys().len(), 2);
}

#[tokio::test]
async fn test_duplicate_names_tracked_separately() {
    let storage = Arc::new(MockStorageService::new());
    storage.fail_on("second");
    let metadata = Arc::new(MockMetadataStore::new());
    let scheduler = scheduler(storage, metadata, 5);

    let files = vec![
        FileSubmission::new("dup.png", Bytes::from_static(b"first")),
        FileSubmission::new("dup.png", Bytes::from_static(b"second")),
    ];
    let (first_id, second_id) = (files[0].id, files[1].id);

    let (ledger, _) = run_batch(
        &scheduler,
        files,
        ClassificationSelection::default(),
        CancellationToken::new(),
    )
    .await;

    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger.get(&first_id).unwrap().stage, UploadStage::Completed);
    assert_eq!(ledger.get(&second_id).unwrap().stage, UploadStage::Failed);
}

#[tokio::test]
async fn test_empty_batch_completes_immediately() {
    let storage = Arc::new(MockStorageService::new());
    let metadata = Arc::new(MockMetadataStore::new());
    let scheduler = scheduler(storage.clone(), metadata, 5);

    let (ledger, calls) = run_batch(
        &scheduler,
        Vec::new(),
        ClassificationSelection::default(),
        CancellationToken::new(),
    )
    .await;

    assert_eq!(calls, 1);
    assert!(ledger.is_empty());
    assert_eq!(storage.upload_count(), 0);
}

#[tokio::test]
async fn test_cancel_before_start_dispatches_nothing() {
    let storage = Arc::new(MockStorageService::new());
    let metadata = Arc::new(MockMetadataStore::new());
    let scheduler = scheduler(storage.clone(), metadata, 2);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let (ledger, calls) = run_batch(
        &scheduler,
        numbered_files(5),
        ClassificationSelection::default(),
        cancel,
    )
    .await;

    assert_eq!(calls, 1);
    assert_eq!(storage.upload_count(), 0);
    for (_, status) in ledger.snapshot() {
        assert_eq!(status.stage, UploadStage::Failed);
        assert_eq!(status.progress, 0);
        assert_eq!(status.error.as_deref(), Some("Upload cancelled"));
    }
}

#[tokio::test]
async fn test_cancel_mid_batch_lets_current_group_finish() {
    let storage = Arc::new(MockStorageService::with_delay(10));
    let metadata = Arc::new(MockMetadataStore::new());
    let scheduler = scheduler(storage.clone(), metadata, 2);

    let cancel = CancellationToken::new();
    storage.cancel_on_first_upload(cancel.clone());

    let (ledger, calls) = run_batch(
        &scheduler,
        numbered_files(5),
        ClassificationSelection::default(),
        cancel,
    )
    .await;

    assert_eq!(calls, 1);
    assert_eq!(storage.upload_count(), 2);
    let summary = ledger.summary();
    assert_eq!(summary.completed, 2);
    assert_eq!(summary.failed, 3);
    assert!(ledger.is_settled());
}

#[tokio::test]
async fn test_service_submit_runs_in_background() {
    let storage = Arc::new(MockStorageService::with_delay(5));
    let metadata = Arc::new(MockMetadataStore::new());
    let config = GalleryConfig {
        batch_width: 3,
        ..GalleryConfig::default()
    };
    let service = UploadService::new(storage.clone(), metadata.clone(), config).unwrap();

    let batch = service
        .submit(numbered_files(7), ClassificationSelection::default())
        .unwrap();
    assert_eq!(batch.group_count, 3);
    assert_eq!(batch.ledger.len(), 7);

    tokio::time::timeout(std::time::Duration::from_secs(5), batch.wait())
        .await
        .expect("batch should finish");

    assert!(batch.is_completed());
    assert!(batch.finished_at().is_some());
    assert_eq!(batch.ledger.summary().completed, 7);
    assert!(service.get(&batch.id).is_some());
    assert_eq!(service.active_batches(), 0);
}

#[tokio::test]
async fn test_service_rejects_oversized_files() {
    let storage = Arc::new(MockStorageService::new());
    let metadata = Arc::new(MockMetadataStore::new());
    let config = GalleryConfig {
        max_file_size: 4,
        ..GalleryConfig::default()
    };
    let service = UploadService::new(storage.clone(), metadata, config).unwrap();

    let result = service.submit(
        vec![FileSubmission::new("big.png", Bytes::from_static(b"too large"))],
        ClassificationSelection::default(),
    );
    assert!(result.is_err());
    assert_eq!(storage.upload_count(), 0);
}

#[tokio::test]
async fn test_service_rejects_zero_width() {
    let storage = Arc::new(MockStorageService::new());
    let metadata = Arc::new(MockMetadataStore::new());
    let config = GalleryConfig {
        batch_width: 0,
        ..GalleryConfig::default()
    };
    assert!(UploadService::new(storage, metadata, config).is_err());
}

#[tokio::test]
async fn test_service_cancel_unknown_batch() {
    let storage = Arc::new(MockStorageService::new());
    let metadata = Arc::new(MockMetadataStore::new());
    let service = UploadService::new(storage, metadata, GalleryConfig::default()).unwrap();
    assert!(!service.cancel(&uuid::Uuid::new_v4()));
}

#[tokio::test]
async fn test_huge_batch_ttl_keeps_finished_batches() {
    let storage = Arc::new(MockStorageService::new());
    let metadata = Arc::new(MockMetadataStore::new());
    let config = GalleryConfig {
        finished_batch_ttl_secs: 10_000_000_000_000,
        ..GalleryConfig::default()
    };
    let service = UploadService::new(storage, metadata, config).unwrap();

    let first = service
        .submit(named_files(&["a.png"]), ClassificationSelection::default())
        .unwrap();
    tokio::time::timeout(std::time::Duration::from_secs(5), first.wait())
        .await
        .expect("batch should finish");

    // Pruning runs on every submission
    let second = service
        .submit(named_files(&["b.png"]), ClassificationSelection::default())
        .unwrap();
    second.wait().await;

    assert_eq!(service.prune_finished(), 0);
    assert!(service.get(&first.id).is_some());
    assert!(service.get(&second.id).is_some());
}
