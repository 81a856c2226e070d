//! Per-slot upload state for the member add/edit form.

use crate::errors::{AppError, UploadError};
use crate::models::{GroupMember, NewMemberData, PhotoFile, PhotoSlot};

use super::collab::PhotoUploader;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SlotStatus {
    #[default]
    Empty,
    Uploading,
    Uploaded(String),
    Failed(String),
}

/// Member data being entered, plus the status of each photo slot.
///
/// An upload failure only marks its own slot; the rest of the form stays
/// usable and the member can be saved without the photo.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemberForm {
    pub data: NewMemberData,
    front: SlotStatus,
    back: SlotStatus,
}

impl MemberForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefill from an existing member for editing.
    pub fn from_member(member: &GroupMember) -> Self {
        let slot = |url: &Option<String>| {
            url.clone()
                .map(SlotStatus::Uploaded)
                .unwrap_or(SlotStatus::Empty)
        };
        Self {
            front: slot(&member.id_front_url),
            back: slot(&member.id_back_url),
            data: member.to_new(),
        }
    }

    pub fn status(&self, slot: PhotoSlot) -> &SlotStatus {
        match slot {
            PhotoSlot::Front => &self.front,
            PhotoSlot::Back => &self.back,
        }
    }

    fn status_mut(&mut self, slot: PhotoSlot) -> &mut SlotStatus {
        match slot {
            PhotoSlot::Front => &mut self.front,
            PhotoSlot::Back => &mut self.back,
        }
    }

    fn url_mut(&mut self, slot: PhotoSlot) -> &mut Option<String> {
        match slot {
            PhotoSlot::Front => &mut self.data.id_front_url,
            PhotoSlot::Back => &mut self.data.id_back_url,
        }
    }

    /// Whether the picker for `slot` should be disabled.
    pub fn is_uploading(&self, slot: PhotoSlot) -> bool {
        *self.status(slot) == SlotStatus::Uploading
    }

    /// Whether the form's save button should be disabled.
    pub fn is_busy(&self) -> bool {
        self.is_uploading(PhotoSlot::Front) || self.is_uploading(PhotoSlot::Back)
    }

    /// Mark `slot` as uploading. Returns `false` if it already is.
    pub fn begin_upload(&mut self, slot: PhotoSlot) -> bool {
        if self.is_uploading(slot) {
            return false;
        }
        *self.status_mut(slot) = SlotStatus::Uploading;
        true
    }

    /// Record the outcome of an upload started with `begin_upload`.
    pub fn finish_upload(
        &mut self,
        slot: PhotoSlot,
        result: Result<String, AppError>,
    ) -> Result<String, UploadError> {
        match result {
            Ok(url) => {
                *self.url_mut(slot) = Some(url.clone());
                *self.status_mut(slot) = SlotStatus::Uploaded(url.clone());
                Ok(url)
            }
            Err(err) => {
                tracing::warn!("Upload of {} photo failed: {}", slot, err);
                let message = err.message().to_string();
                *self.status_mut(slot) = SlotStatus::Failed(message.clone());
                Err(UploadError { slot, message })
            }
        }
    }

    /// Upload `file` into `slot` and store the resulting URL on the form.
    pub async fn upload(
        &mut self,
        uploader: &dyn PhotoUploader,
        slot: PhotoSlot,
        file: PhotoFile,
    ) -> Result<String, UploadError> {
        if !self.begin_upload(slot) {
            return Err(UploadError {
                slot,
                message: "Upload already in progress".to_string(),
            });
        }
        let result = uploader.upload_photo(slot, file).await;
        self.finish_upload(slot, result)
    }

    /// Drop the photo in `slot`.
    pub fn clear_photo(&mut self, slot: PhotoSlot) {
        *self.url_mut(slot) = None;
        *self.status_mut(slot) = SlotStatus::Empty;
    }
}
