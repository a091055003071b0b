#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use rust_gallery_backend::entities::images;
use rust_gallery_backend::infrastructure::database;
use rust_gallery_backend::services::metadata_store::{MetadataStore, NewImageRecord};
use rust_gallery_backend::services::storage::{ObjectMetadata, StorageService};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub async fn setup_test_db() -> DatabaseConnection {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    database::run_migrations(&db).await.unwrap();
    db
}

/// In-memory object store that records what happened to it.
///
/// Payloads are the file name as bytes in most tests, so `events` reads
/// like `start:a.png`, `end:a.png`.
pub struct MockStorageService {
    files: Mutex<HashMap<String, (Bytes, DateTime<Utc>)>>,
    pub events: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay_ms: u64,
    fail_payloads: Mutex<Vec<Bytes>>,
    cancel_on_first_upload: Mutex<Option<CancellationToken>>,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self::with_delay(0)
    }

    pub fn with_delay(delay_ms: u64) -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
            events: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            delay_ms,
            fail_payloads: Mutex::new(Vec::new()),
            cancel_on_first_upload: Mutex::new(None),
        }
    }

    /// Uploads whose payload equals `payload` fail after the transfer delay.
    pub fn fail_on(&self, payload: &str) {
        self.fail_payloads
            .lock()
            .unwrap()
            .push(Bytes::copy_from_slice(payload.as_bytes()));
    }

    pub fn cancel_on_first_upload(&self, token: CancellationToken) {
        *self.cancel_on_first_upload.lock().unwrap() = Some(token);
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.files.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn contains(&self, key: &str) -> bool {
        self.files.lock().unwrap().contains_key(key)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn upload_count(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.starts_with("start:"))
            .count()
    }

    pub fn put_with_age(&self, key: &str, age: Duration) {
        self.files
            .lock()
            .unwrap()
            .insert(key.to_string(), (Bytes::from_static(b"x"), Utc::now() - age));
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn upload_file(&self, key: &str, data: Bytes) -> anyhow::Result<()> {
        let label = String::from_utf8_lossy(&data).to_string();
        self.events.lock().unwrap().push(format!("start:{}", label));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(token) = self.cancel_on_first_upload.lock().unwrap().take() {
            token.cancel();
        }

        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.events.lock().unwrap().push(format!("end:{}", label));

        if self.fail_payloads.lock().unwrap().contains(&data) {
            return Err(anyhow::anyhow!("storage unavailable"));
        }

        self.files
            .lock()
            .unwrap()
            .insert(key.to_string(), (data, Utc::now()));
        Ok(())
    }

    async fn get_file(&self, key: &str) -> anyhow::Result<Bytes> {
        self.files
            .lock()
            .unwrap()
            .get(key)
            .map(|(data, _)| data.clone())
            .ok_or_else(|| anyhow::anyhow!("Key not found"))
    }

    async fn delete_file(&self, key: &str) -> anyhow::Result<()> {
        self.files.lock().unwrap().remove(key);
        Ok(())
    }

    async fn file_exists(&self, key: &str) -> anyhow::Result<bool> {
        Ok(self.contains(key))
    }

    async fn list_objects(&self, prefix: &str) -> anyhow::Result<Vec<String>> {
        Ok(self
            .keys()
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect())
    }

    async fn get_object_metadata(&self, key: &str) -> anyhow::Result<ObjectMetadata> {
        let files = self.files.lock().unwrap();
        let (data, modified) = files
            .get(key)
            .ok_or_else(|| anyhow::anyhow!("Key not found"))?;
        Ok(ObjectMetadata {
            last_modified: Some(*modified),
            size: data.len() as i64,
        })
    }
}

/// Metadata store keeping records in memory; fails for chosen titles.
pub struct MockMetadataStore {
    pub records: Mutex<Vec<NewImageRecord>>,
    fail_titles: Mutex<Vec<String>>,
}

impl MockMetadataStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail_titles: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_on_title(&self, title: &str) {
        self.fail_titles.lock().unwrap().push(title.to_string());
    }

    pub fn paths(&self) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.stored_reference.clone())
            .collect()
    }
}

#[async_trait]
impl MetadataStore for MockMetadataStore {
    async fn create_record(&self, record: NewImageRecord) -> anyhow::Result<images::Model> {
        if self.fail_titles.lock().unwrap().contains(&record.title) {
            return Err(anyhow::anyhow!("database is locked"));
        }

        let model = images::Model {
            id: Uuid::new_v4().to_string(),
            title: record.title.clone(),
            description: record.description.clone(),
            path: record.stored_reference.clone(),
            created_at: Utc::now(),
        };
        self.records.lock().unwrap().push(record);
        Ok(model)
    }

    async fn path_exists(&self, path: &str) -> anyhow::Result<bool> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.stored_reference == path))
    }
}
