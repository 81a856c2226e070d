//! Collaborators the editing core performs I/O through.
//!
//! Handles are injected at construction; the core never reaches for a shared
//! client of its own.

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::{Group, GroupDraft, MemberPage, PageQuery, PhotoFile, PhotoSlot};

/// Loads one page of persisted members of a group.
///
/// An empty page is a successful result, not an error.
#[async_trait]
pub trait MemberSource: Send + Sync {
    async fn fetch_members_page(
        &self,
        group_id: &str,
        query: &PageQuery,
    ) -> Result<MemberPage, AppError>;
}

/// Stores an identity photo and returns the URL it is served from.
#[async_trait]
pub trait PhotoUploader: Send + Sync {
    async fn upload_photo(&self, slot: PhotoSlot, file: PhotoFile) -> Result<String, AppError>;
}

/// The persistence boundary: creates a group or applies pending changes.
#[async_trait]
pub trait GroupSubmitter: Send + Sync {
    async fn submit(&self, draft: GroupDraft) -> Result<Group, AppError>;
}

/// Collaborators every session needs, regardless of mode.
#[derive(Clone)]
pub struct Collaborators {
    pub uploader: Arc<dyn PhotoUploader>,
    pub submitter: Arc<dyn GroupSubmitter>,
}

impl Collaborators {
    pub fn new(uploader: Arc<dyn PhotoUploader>, submitter: Arc<dyn GroupSubmitter>) -> Self {
        Self {
            uploader,
            submitter,
        }
    }
}
