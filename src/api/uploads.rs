//! Photo upload endpoint.

use axum::extract::{Multipart, State};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{PhotoFile, PhotoSlot, UploadedPhoto};
use crate::AppState;

/// POST /api/uploads - Store one identity photo.
///
/// Expects a `file` part and an optional `slot` part (`front` or `back`,
/// defaulting to `front`).
pub async fn upload_photo(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<UploadedPhoto> {
    let mut slot = PhotoSlot::Front;
    let mut file: Option<PhotoFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "slot" => {
                let raw = field.text().await.unwrap_or_default();
                slot = PhotoSlot::parse(raw.trim())
                    .ok_or_else(|| AppError::BadRequest(format!("Unknown photo slot: {}", raw)))?;
            }
            "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Upload(format!("Failed to read upload: {}", e)))?;
                file = Some(PhotoFile {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {
                let _ = field.bytes().await;
            }
        }
    }

    let file = file.ok_or_else(|| AppError::BadRequest("Missing file part".to_string()))?;
    let url = state.uploads.save(slot, &file).await?;

    tracing::info!("Uploaded {} photo {}", slot, file.file_name);

    success(UploadedPhoto { url })
}
