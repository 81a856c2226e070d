//! Local storage for identity photos.
//!
//! Files land in the upload directory under a random name and are served
//! back from `{public_url}/uploads/`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::editor::PhotoUploader;
use crate::errors::AppError;
use crate::models::{PhotoFile, PhotoSlot};

/// Allowed image extensions
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Maximum file size (5 MB)
pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

/// Writes uploaded photos to a directory served over HTTP.
#[derive(Debug, Clone)]
pub struct LocalPhotoStore {
    dir: PathBuf,
    public_url: String,
}

impl LocalPhotoStore {
    pub fn new(dir: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Validate and persist one photo, returning its public URL.
    pub async fn save(&self, slot: PhotoSlot, file: &PhotoFile) -> Result<String, AppError> {
        if file.bytes.is_empty() {
            return Err(AppError::Upload("File is empty".to_string()));
        }
        if file.bytes.len() > MAX_FILE_SIZE {
            return Err(AppError::Upload("File too large (max 5 MB)".to_string()));
        }

        let extension = file
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .ok_or_else(|| AppError::Upload("Invalid filename".to_string()))?;

        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(AppError::Upload(format!(
                "Invalid file type. Allowed: {}",
                ALLOWED_EXTENSIONS.join(", ")
            )));
        }

        fs::create_dir_all(&self.dir).await.map_err(|e| {
            AppError::Internal(format!("Failed to create uploads directory: {}", e))
        })?;

        let new_filename = format!("{}-{}.{}", slot, Uuid::new_v4(), extension);
        let path = self.dir.join(&new_filename);

        let mut out = fs::File::create(&path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create file: {}", e)))?;
        out.write_all(&file.bytes)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write file: {}", e)))?;
        out.flush().await?;

        tracing::debug!("Stored {} photo as {:?}", slot, path);

        Ok(format!("{}/uploads/{}", self.public_url, new_filename))
    }
}

#[async_trait]
impl PhotoUploader for LocalPhotoStore {
    async fn upload_photo(&self, slot: PhotoSlot, file: PhotoFile) -> Result<String, AppError> {
        self.save(slot, &file).await
    }
}
