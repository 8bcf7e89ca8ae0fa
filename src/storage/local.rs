use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

use super::{generate_file_name, FileStorage, StorageError, StoredFile, UploadedFile};
use crate::models::FileKey;

/// Stores uploads as flat files under one folder, served back by
/// `GET /files/:name`.
pub struct LocalFileStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalFileStorage {
    pub fn new(root: PathBuf, public_base_url: impl Into<String>) -> Self {
        Self {
            root,
            public_base_url: public_base_url.into(),
        }
    }

    fn url_for(&self, key: &FileKey) -> String {
        format!(
            "{}/files/{}",
            self.public_base_url.trim_end_matches('/'),
            key
        )
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn upload(&self, file: UploadedFile) -> Result<StoredFile, StorageError> {
        fs::create_dir_all(&self.root).await?;

        let key = FileKey(generate_file_name());
        fs::write(self.root.join(key.as_str()), &file.data).await?;
        tracing::info!("Stored {} ({} bytes)", key, file.data.len());

        let url = self.url_for(&key);
        Ok(StoredFile { key, url })
    }

    async fn resolve(&self, key: &FileKey) -> Result<String, StorageError> {
        Ok(self.url_for(key))
    }

    async fn delete(&self, key: &FileKey) -> Result<(), StorageError> {
        match fs::remove_file(self.root.join(key.as_str())).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::Missing(key.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(data: &[u8]) -> UploadedFile {
        UploadedFile {
            file_name: Some("test.pdf".to_string()),
            content_type: Some("application/pdf".to_string()),
            data: data.to_vec(),
        }
    }

    #[tokio::test]
    async fn upload_writes_file_and_returns_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path().join("uploads"), "http://localhost:8080/");

        let stored = storage.upload(upload(b"%PDF-1.4 essay")).await.unwrap();

        let on_disk = std::fs::read(dir.path().join("uploads").join(stored.key.as_str())).unwrap();
        assert_eq!(on_disk, b"%PDF-1.4 essay");
        assert_eq!(
            stored.url,
            format!("http://localhost:8080/files/{}", stored.key)
        );
        assert_eq!(storage.resolve(&stored.key).await.unwrap(), stored.url);
    }

    #[tokio::test]
    async fn delete_removes_the_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path().to_path_buf(), "http://localhost");

        let stored = storage.upload(upload(b"%PDF")).await.unwrap();
        storage.delete(&stored.key).await.unwrap();

        assert!(!dir.path().join(stored.key.as_str()).exists());
        assert!(matches!(
            storage.delete(&stored.key).await,
            Err(StorageError::Missing(_))
        ));
    }
}
