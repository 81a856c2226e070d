//! HTTP backend for the editor.
//!
//! Talks to the REST API and unwraps its `{success, data}` / `{success, error}`
//! envelopes back into models and `AppError`s.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::api::ApiResponse;
use crate::editor::{GroupSubmitter, MemberSource, PhotoUploader};
use crate::errors::{AppError, ErrorResponse};
use crate::models::{Group, GroupDraft, MemberPage, PageQuery, PhotoFile, PhotoSlot, UploadedPhoto};

/// Fetches, uploads and submits through a running roster server.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AppError> {
        let resp = request.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if status.is_success() {
            let envelope: ApiResponse<T> = serde_json::from_str(&text)
                .map_err(|e| AppError::Network(format!("Malformed response: {}", e)))?;
            return Ok(envelope.data);
        }

        match serde_json::from_str::<ErrorResponse>(&text) {
            Ok(body) => Err(AppError::from_code(&body.error.code, body.error.message)),
            // Extractor rejections are plain text
            Err(_) if status.is_client_error() => Err(AppError::BadRequest(format!(
                "HTTP {}: {}",
                status.as_u16(),
                text.trim()
            ))),
            Err(_) => Err(AppError::Network(format!(
                "HTTP {}: {}",
                status.as_u16(),
                text.trim()
            ))),
        }
    }

    pub async fn get_group(&self, group_id: &str) -> Result<Group, AppError> {
        self.send(self.client.get(self.url(&format!("/api/groups/{}", group_id))))
            .await
    }
}

#[async_trait]
impl MemberSource for HttpBackend {
    async fn fetch_members_page(
        &self,
        group_id: &str,
        query: &PageQuery,
    ) -> Result<MemberPage, AppError> {
        let url = self.url(&format!("/api/groups/{}/members", group_id));
        self.send(self.client.get(url).query(query)).await
    }
}

#[async_trait]
impl PhotoUploader for HttpBackend {
    async fn upload_photo(&self, slot: PhotoSlot, file: PhotoFile) -> Result<String, AppError> {
        let mut part = Part::bytes(file.bytes).file_name(file.file_name);
        if let Some(content_type) = &file.content_type {
            part = part.mime_str(content_type)?;
        }
        let form = Form::new().text("slot", slot.as_str()).part("file", part);

        let uploaded: UploadedPhoto = self
            .send(self.client.post(self.url("/api/uploads")).multipart(form))
            .await?;
        Ok(uploaded.url)
    }
}

#[async_trait]
impl GroupSubmitter for HttpBackend {
    async fn submit(&self, draft: GroupDraft) -> Result<Group, AppError> {
        match draft {
            GroupDraft::Create(request) => {
                self.send(self.client.post(self.url("/api/groups")).json(&request))
                    .await
            }
            GroupDraft::Edit { group_id, changes } => {
                let url = self.url(&format!("/api/groups/{}", group_id));
                self.send(self.client.patch(url).json(&changes)).await
            }
        }
    }
}
