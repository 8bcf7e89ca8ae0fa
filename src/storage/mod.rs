//! File storage for student essays and teacher corrections.

mod local;
#[cfg(test)]
mod memory;

pub use local::LocalFileStorage;
#[cfg(test)]
pub use memory::InMemoryFileStorage;

use async_trait::async_trait;
use chrono::Utc;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

use crate::models::FileKey;

/// A file received in a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Where an upload ended up: the key to keep and the URL to hand out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub key: FileKey,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("file {0} does not exist")]
    Missing(FileKey),

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn upload(&self, file: UploadedFile) -> Result<StoredFile, StorageError>;

    /// Public URL for a stored file.
    async fn resolve(&self, key: &FileKey) -> Result<String, StorageError>;

    async fn delete(&self, key: &FileKey) -> Result<(), StorageError>;
}

/// Checks an upload before it reaches storage.
///
/// Files must be non-empty; a named file must be a PDF.
pub fn validate_upload(file: &UploadedFile) -> Result<(), String> {
    if file.data.is_empty() {
        return Err("file is empty".to_string());
    }
    match file.file_name.as_deref().filter(|name| !name.is_empty()) {
        Some(name) if !name.to_lowercase().ends_with(".pdf") => {
            Err(format!("{name} is not a PDF file"))
        }
        _ => Ok(()),
    }
}

pub fn generate_file_name() -> String {
    format!(
        "{}_{}.pdf",
        Utc::now().format("%Y%m%d"),
        &Uuid::new_v4().simple().to_string()[..8]
    )
}

/// Rejects names that could escape the upload folder or break a header.
pub fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains("..")
        && !name
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '"') || c.is_control())
}

pub fn ensure_dir(upload_folder: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(upload_folder)
}
