//! Image uploads: validation, naming and storage on local disk.

use axum::extract::multipart::{Field, Multipart, MultipartError};
use bytes::{Bytes, BytesMut};
use rand::Rng;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024; // 5MB
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif", "webp"];
const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];
const PUBLIC_PREFIX: &str = "/uploads";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Only image files are allowed (jpeg, jpg, png, gif, webp)")]
    UnsupportedType,
    #[error("File too large. Maximum size is 5MB.")]
    TooLarge,
    #[error("Invalid multipart data: {0}")]
    Multipart(#[from] MultipartError),
    #[error("Failed to save file: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// Problems with what the user sent, as opposed to server failures.
    pub fn is_rejection(&self) -> bool {
        matches!(self, UploadError::UnsupportedType | UploadError::TooLarge)
    }
}

/// A file part received in a form submission, not yet written anywhere.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
    /// Set when the part exceeded [`MAX_FILE_SIZE`]; `bytes` is then truncated.
    pub oversized: bool,
}

/// A file written to the upload directory.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredUpload {
    pub filename: String,
    pub public_path: String,
    pub size: usize,
}

/// Text fields of a multipart form plus the single file field it may carry.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub file: Option<IncomingFile>,
}

impl MultipartForm {
    /// Read every part. Only the part named `file_field` is treated as a file;
    /// an empty file part (nothing chosen in the browser) counts as no upload.
    pub async fn read(mut multipart: Multipart, file_field: &str) -> Result<Self, UploadError> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            if name == file_field {
                let file = read_file(field).await?;
                if !file.file_name.is_empty() || !file.bytes.is_empty() {
                    form.file = Some(file);
                }
            } else if !name.is_empty() {
                form.fields.insert(name, field.text().await?);
            }
        }

        Ok(form)
    }
}

/// Stream a file part, keeping at most `MAX_FILE_SIZE + 1` bytes.
async fn read_file(mut field: Field<'_>) -> Result<IncomingFile, UploadError> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().unwrap_or_default().to_string();

    let mut buffer = BytesMut::new();
    let mut oversized = false;
    while let Some(chunk) = field.chunk().await? {
        if oversized {
            continue;
        }
        if buffer.len() + chunk.len() > MAX_FILE_SIZE {
            oversized = true;
            continue;
        }
        buffer.extend_from_slice(&chunk);
    }

    Ok(IncomingFile {
        file_name,
        content_type,
        bytes: buffer.freeze(),
        oversized,
    })
}

fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Both the extension and the declared media type must be on the allow-list.
pub fn validate(file: &IncomingFile) -> Result<String, UploadError> {
    let ext = extension_of(&file.file_name).ok_or(UploadError::UnsupportedType)?;
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(UploadError::UnsupportedType);
    }

    let mime = file.content_type.to_lowercase();
    let mime = mime.split(';').next().unwrap_or_default().trim();
    if !ALLOWED_MIME_TYPES.contains(&mime) {
        return Err(UploadError::UnsupportedType);
    }

    if file.oversized || file.bytes.len() > MAX_FILE_SIZE {
        return Err(UploadError::TooLarge);
    }

    Ok(ext)
}

/// `<unix millis>-<random>.<ext>`
pub fn generate_filename(ext: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let random: u32 = rand::rng().random_range(0..1_000_000_000);
    format!("{}-{}.{}", millis, random, ext)
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Validate then write the file. Nothing touches disk when validation fails.
    pub async fn save(&self, file: &IncomingFile) -> Result<StoredUpload, UploadError> {
        let ext = validate(file)?;

        tokio::fs::create_dir_all(&self.dir).await?;

        let filename = generate_filename(&ext);
        tokio::fs::write(self.dir.join(&filename), &file.bytes).await?;

        tracing::info!(
            filename = %filename,
            original = %file.file_name,
            size = file.bytes.len(),
            "image uploaded"
        );

        Ok(StoredUpload {
            public_path: format!("{}/{}", PUBLIC_PREFIX, filename),
            size: file.bytes.len(),
            filename,
        })
    }

    /// Remove a file written for a record that was never persisted.
    pub async fn discard(&self, upload: &StoredUpload) {
        if let Err(e) = tokio::fs::remove_file(self.dir.join(&upload.filename)).await {
            tracing::warn!(
                filename = %upload.filename,
                error = %e,
                "failed to remove orphaned upload"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, mime: &str, size: usize) -> IncomingFile {
        IncomingFile {
            file_name: name.to_string(),
            content_type: mime.to_string(),
            bytes: Bytes::from(vec![0u8; size]),
            oversized: false,
        }
    }

    #[test]
    fn test_validate_accepts_images() {
        assert_eq!(validate(&file("me.PNG", "image/png", 10)).unwrap(), "png");
        assert_eq!(validate(&file("a.b.jpeg", "image/jpeg", 10)).unwrap(), "jpeg");
        assert_eq!(validate(&file("x.webp", "image/webp", 10)).unwrap(), "webp");
    }

    #[test]
    fn test_validate_requires_both_extension_and_mime() {
        assert!(matches!(
            validate(&file("script.exe", "image/png", 10)),
            Err(UploadError::UnsupportedType)
        ));
        assert!(matches!(
            validate(&file("photo.png", "application/octet-stream", 10)),
            Err(UploadError::UnsupportedType)
        ));
        assert!(matches!(
            validate(&file("noextension", "image/png", 10)),
            Err(UploadError::UnsupportedType)
        ));
    }

    #[test]
    fn test_validate_rejects_oversized() {
        assert!(validate(&file("ok.png", "image/png", MAX_FILE_SIZE)).is_ok());
        assert!(matches!(
            validate(&file("big.png", "image/png", MAX_FILE_SIZE + 1)),
            Err(UploadError::TooLarge)
        ));
        let mut truncated = file("big.png", "image/png", 10);
        truncated.oversized = true;
        assert!(matches!(validate(&truncated), Err(UploadError::TooLarge)));
    }

    #[test]
    fn test_generate_filename_shape() {
        let name = generate_filename("png");
        let (stem, ext) = name.rsplit_once('.').unwrap();
        assert_eq!(ext, "png");
        let (millis, random) = stem.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert!(random.parse::<u32>().unwrap() < 1_000_000_000);
    }

    #[tokio::test]
    async fn test_save_writes_and_discard_removes() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().join("uploads"));

        let stored = store.save(&file("me.jpg", "image/jpeg", 64)).await.unwrap();
        assert!(stored.public_path.starts_with("/uploads/"));
        assert!(stored.filename.ends_with(".jpg"));
        let on_disk = store.dir().join(&stored.filename);
        assert_eq!(std::fs::metadata(&on_disk).unwrap().len(), 64);

        store.discard(&stored).await;
        assert!(!on_disk.exists());
    }

    #[tokio::test]
    async fn test_rejected_file_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().join("uploads"));

        let result = store.save(&file("doc.pdf", "application/pdf", 64)).await;
        assert!(result.unwrap_err().is_rejection());
        assert!(!store.dir().exists());
    }
}
