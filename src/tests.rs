//! Integration tests for the roster server and its HTTP backend.

use std::sync::Arc;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::client::HttpBackend;
use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::editor::{Collaborators, EditorSettings, GroupDetails, GroupEditor, MemberForm};
use crate::errors::{AppError, SubmitError};
use crate::models::{GroupDraft, MemberRole, NewMemberData, PhotoFile, PhotoSlot};
use crate::{create_router, AppState};

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");
        let upload_dir = temp_dir.path().join("uploads");

        // Bind first so uploaded photo URLs point at the real port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        let pool = init_database(&db_path).await.expect("Failed to init DB");

        let config = Config {
            db_path,
            upload_dir,
            public_url: base_url.clone(),
            bind_addr: addr,
            log_level: "warn".to_string(),
            search_debounce: std::time::Duration::from_millis(500),
            page_size: 50,
        };

        let app = create_router(AppState::new(Repository::new(pool), config));

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        TestFixture {
            client: Client::new(),
            base_url,
            temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn backend(&self) -> Arc<HttpBackend> {
        Arc::new(HttpBackend::with_client(self.client.clone(), &self.base_url))
    }

    async fn create_group(&self, body: Value) -> Value {
        let resp = self
            .client
            .post(self.url("/api/groups"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["data"].clone()
    }
}

fn member(name: &str, phone: &str) -> NewMemberData {
    NewMemberData {
        full_name: name.to_string(),
        national_id: String::new(),
        role: MemberRole::Member,
        phone_number: phone.to_string(),
        id_front_url: None,
        id_back_url: None,
    }
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_group_crud_and_member_pages() {
    let fixture = TestFixture::new().await;

    let group = fixture
        .create_group(json!({
            "name": "Umoja",
            "description": "Savings circle",
            "members": [
                {"fullName": "Baraka", "phoneNumber": "0711", "role": "chair"},
                {"fullName": "Amani", "phoneNumber": "0712"},
                {"fullName": "Zawadi", "phoneNumber": "0713", "nationalId": "998"}
            ]
        }))
        .await;
    let id = group["id"].as_str().unwrap().to_string();
    assert_eq!(group["name"], "Umoja");

    // Get
    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/groups/{}", id)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["description"], "Savings circle");

    // Sorted page
    let resp = fixture
        .client
        .get(fixture.url(&format!(
            "/api/groups/{}/members?page=0&pageSize=2&sortField=fullName&sortOrder=desc",
            id
        )))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["totalCount"], 3);
    let members = body["data"]["members"].as_array().unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[0]["fullName"], "Zawadi");
    assert_eq!(members[1]["fullName"], "Baraka");
    assert_eq!(members[1]["role"], "chair");

    // Search matches any field
    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/groups/{}/members?search=998", id)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["totalCount"], 1);
    assert_eq!(body["data"]["members"][0]["phoneNumber"], "0713");
}

#[tokio::test]
async fn test_error_envelopes() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/api/groups/nonexistent"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let resp = fixture
        .client
        .post(fixture.url("/api/groups"))
        .json(&json!({"name": " "}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let resp = fixture
        .client
        .post(fixture.url("/api/groups"))
        .json(&json!({
            "name": "Twins",
            "members": [
                {"fullName": "A", "phoneNumber": "0700"},
                {"fullName": "B", "phoneNumber": "0700"}
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_upload_and_serve_photo() {
    let fixture = TestFixture::new().await;
    let backend = fixture.backend();

    let url = crate::editor::PhotoUploader::upload_photo(
        backend.as_ref(),
        PhotoSlot::Back,
        PhotoFile {
            file_name: "id-back.jpg".to_string(),
            content_type: Some("image/jpeg".to_string()),
            bytes: vec![1, 2, 3, 4],
        },
    )
    .await
    .unwrap();
    assert!(url.starts_with(&format!("{}/uploads/back-", fixture.base_url)));

    let resp = fixture.client.get(&url).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.bytes().await.unwrap().to_vec(), vec![1, 2, 3, 4]);

    let err = crate::editor::PhotoUploader::upload_photo(
        backend.as_ref(),
        PhotoSlot::Front,
        PhotoFile {
            file_name: "notes.txt".to_string(),
            content_type: None,
            bytes: vec![1],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Upload(_)));
    assert_eq!(
        std::fs::read_dir(fixture.temp_dir.path().join("uploads"))
            .unwrap()
            .count(),
        1
    );
}

#[tokio::test]
async fn test_editor_create_then_edit_over_http() {
    let fixture = TestFixture::new().await;
    let backend = fixture.backend();
    let settings = EditorSettings::default();
    let collaborators = Collaborators::new(backend.clone(), backend.clone());

    // Create mode
    let mut editor = GroupEditor::create(
        collaborators.clone(),
        &settings,
        GroupDetails {
            name: "Jirani".to_string(),
            description: String::new(),
        },
    );

    let mut form = MemberForm::new();
    form.data = member("Neema", "0720");
    editor
        .upload_photo(
            &mut form,
            PhotoSlot::Front,
            PhotoFile {
                file_name: "front.png".to_string(),
                content_type: Some("image/png".to_string()),
                bytes: vec![9; 32],
            },
        )
        .await
        .unwrap();
    assert!(form.data.id_front_url.is_some());

    assert_eq!(editor.add_member(form.data.clone()), Ok(true));
    assert_eq!(editor.add_member(member("Juma", "0721")), Ok(true));
    assert!(editor.add_member(member("Copy", "0721")).is_err());

    let group = editor.submit().await.unwrap();
    assert_eq!(group.name, "Jirani");
    assert!(!editor.has_changes());

    // Edit mode
    let fetched = backend.get_group(&group.id).await.unwrap();
    let mut editor = GroupEditor::edit(fetched, backend.clone(), collaborators, &settings);
    assert!(editor.refresh().await);
    assert_eq!(editor.visible().total_count, 2);

    let juma = editor
        .visible()
        .members
        .iter()
        .find(|m| m.full_name == "Juma")
        .map(|m| m.id.clone())
        .unwrap();
    let neema = editor
        .visible()
        .members
        .iter()
        .find(|m| m.full_name == "Neema")
        .cloned()
        .unwrap();

    assert!(editor.remove_member(&juma));
    let mut promoted = neema.to_new();
    promoted.role = MemberRole::Secretary;
    assert_eq!(editor.update_member(&neema.id, promoted), Ok(true));
    assert_eq!(editor.add_member(member("Imani", "0722")), Ok(true));

    match editor.draft() {
        GroupDraft::Edit { changes, .. } => {
            assert_eq!(changes.deleted_member_ids, vec![juma.clone()]);
            assert_eq!(changes.added_members.len(), 1);
            let patch = &changes.updated_members[&neema.id];
            assert_eq!(patch.role, Some(MemberRole::Secretary));
            assert_eq!(patch.full_name, None);
        }
        other => panic!("unexpected draft {:?}", other),
    }

    editor.submit().await.unwrap();
    assert!(!editor.has_changes());

    let view = editor.visible();
    assert_eq!(view.total_count, 2);
    assert!(view.members.iter().all(|m| m.id != juma));
    let saved = view.members.iter().find(|m| m.id == neema.id).unwrap();
    assert_eq!(saved.role, MemberRole::Secretary);
    assert_eq!(saved.id_front_url, neema.id_front_url);

    // Loaded members are checked locally
    assert!(editor.add_member(member("Clash", "0720")).is_err());

    // Server-side uniqueness surfaces as a rejected submit with a banner
    let mut fresh = GroupEditor::edit(
        backend.get_group(&group.id).await.unwrap(),
        backend.clone(),
        Collaborators::new(backend.clone(), backend.clone()),
        &settings,
    );
    // Nothing loaded yet, so the local duplicate check cannot see 0720
    assert_eq!(fresh.add_member(member("Clash", "0720")), Ok(true));
    match fresh.submit().await {
        Err(SubmitError::Rejected(AppError::Conflict(_))) => {}
        other => panic!("unexpected result {:?}", other),
    }
    assert!(fresh.banner().is_some());
    assert!(fresh.has_changes());
}
