use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;

use super::{FileStorage, StorageError, StoredFile, UploadedFile};
use crate::models::FileKey;

/// Test double that keeps uploads in a map and can be told to fail.
pub struct InMemoryFileStorage {
    base_url: String,
    files: RwLock<HashMap<FileKey, UploadedFile>>,
    counter: AtomicU64,
    fail_uploads: AtomicBool,
    fail_resolves: AtomicBool,
}

impl InMemoryFileStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            files: RwLock::new(HashMap::new()),
            counter: AtomicU64::new(0),
            fail_uploads: AtomicBool::new(false),
            fail_resolves: AtomicBool::new(false),
        }
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_resolves(&self, fail: bool) {
        self.fail_resolves.store(fail, Ordering::SeqCst);
    }

    pub async fn contains(&self, key: &FileKey) -> bool {
        self.files.read().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    pub fn url_for(&self, key: &FileKey) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

#[async_trait]
impl FileStorage for InMemoryFileStorage {
    async fn upload(&self, file: UploadedFile) -> Result<StoredFile, StorageError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("bucket unreachable".to_string()));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let key = FileKey(format!("upload_{n}.pdf"));
        self.files.write().await.insert(key.clone(), file);
        Ok(StoredFile {
            url: self.url_for(&key),
            key,
        })
    }

    async fn resolve(&self, key: &FileKey) -> Result<String, StorageError> {
        if self.fail_resolves.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("bucket unreachable".to_string()));
        }
        Ok(self.url_for(key))
    }

    async fn delete(&self, key: &FileKey) -> Result<(), StorageError> {
        match self.files.write().await.remove(key) {
            Some(_) => Ok(()),
            None => Err(StorageError::Missing(key.clone())),
        }
    }
}
