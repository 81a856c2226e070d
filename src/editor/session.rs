//! One group editing session: owns the history, the view parameters and the
//! injected collaborators, and is the only thing that commits snapshots.
//!
//! Asynchronous work is split into `begin_*` (takes `&mut self`, returns a
//! detached pending operation), `run` (no borrow of the editor) and
//! `finish_*` (applies the result). The UI can keep handling events while a
//! fetch or submission is in flight, and a fetch that has been superseded by
//! a newer one is dropped when it finishes, whatever order they complete in.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::errors::{AppError, Banner, BannerKind, FieldError, SubmitError, UploadError};
use crate::models::{
    EditOperation, Group, GroupChanges, GroupDraft, GroupMember, MemberField, MemberPage,
    NewGroup, NewMemberData, PageQuery, PhotoFile, PhotoSlot, SortOrder, DEFAULT_PAGE_SIZE,
};

use super::collab::{Collaborators, GroupSubmitter, MemberSource};
use super::debounce::Debounced;
use super::diff::compute_changes;
use super::edit_log::EditLog;
use super::history::History;
use super::photos::MemberForm;
use super::projector::{project_create, project_edit, MemberView};
use super::state::{CreateState, EditState, GroupDetails};
use super::validation;

/// Tunables for an editing session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSettings {
    pub search_debounce: Duration,
    pub page_size: usize,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            search_debounce: Duration::from_millis(500),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

struct EditSession {
    group: Group,
    source: Arc<dyn MemberSource>,
    history: History<EditState>,
    base: MemberPage,
    /// Generation of the most recently issued fetch.
    issued: u64,
    /// Generation of the most recently applied fetch.
    completed: u64,
}

enum Session {
    Create(History<CreateState>),
    Edit(EditSession),
}

/// A member page request detached from the editor.
pub struct PendingFetch {
    generation: u64,
    group_id: String,
    query: PageQuery,
    source: Arc<dyn MemberSource>,
}

impl PendingFetch {
    pub fn query(&self) -> &PageQuery {
        &self.query
    }

    pub async fn run(self) -> FetchResult {
        let result = self
            .source
            .fetch_members_page(&self.group_id, &self.query)
            .await;
        FetchResult {
            generation: self.generation,
            result,
        }
    }
}

/// Outcome of a `PendingFetch`, to be handed back to `finish_fetch`.
pub struct FetchResult {
    generation: u64,
    result: Result<MemberPage, AppError>,
}

/// A submission detached from the editor.
pub struct PendingSubmit {
    draft: GroupDraft,
    submitter: Arc<dyn GroupSubmitter>,
}

impl PendingSubmit {
    pub fn draft(&self) -> &GroupDraft {
        &self.draft
    }

    pub async fn run(self) -> Result<Group, AppError> {
        self.submitter.submit(self.draft).await
    }
}

/// Editing session for a new group (create mode) or an existing one (edit mode).
pub struct GroupEditor {
    session: Session,
    collaborators: Collaborators,
    search: Debounced<String>,
    page: usize,
    page_size: usize,
    sort_field: Option<MemberField>,
    sort_order: SortOrder,
    banner: Option<Banner>,
    submitting: bool,
}

impl GroupEditor {
    /// Start a session for a group that does not exist yet.
    pub fn create(
        collaborators: Collaborators,
        settings: &EditorSettings,
        details: GroupDetails,
    ) -> Self {
        let initial = CreateState {
            details,
            members: Vec::new(),
        };
        Self::with_session(
            Session::Create(History::new(initial)),
            collaborators,
            settings,
        )
    }

    /// Start a session for an existing group. Members are loaded page by page
    /// from `source`; call `refresh` to load the first page.
    pub fn edit(
        group: Group,
        source: Arc<dyn MemberSource>,
        collaborators: Collaborators,
        settings: &EditorSettings,
    ) -> Self {
        let initial = EditState {
            details: GroupDetails {
                name: group.name.clone(),
                description: group.description.clone(),
            },
            log: EditLog::new(),
        };
        let session = EditSession {
            group,
            source,
            history: History::new(initial),
            base: MemberPage::default(),
            issued: 0,
            completed: 0,
        };
        Self::with_session(Session::Edit(session), collaborators, settings)
    }

    fn with_session(
        session: Session,
        collaborators: Collaborators,
        settings: &EditorSettings,
    ) -> Self {
        Self {
            session,
            collaborators,
            search: Debounced::new(String::new(), settings.search_debounce),
            page: 0,
            page_size: settings.page_size.max(1),
            sort_field: None,
            sort_order: SortOrder::Asc,
            banner: None,
            submitting: false,
        }
    }

    pub fn is_edit_mode(&self) -> bool {
        matches!(self.session, Session::Edit(_))
    }

    /// Id of the group being edited; `None` in create mode.
    pub fn group_id(&self) -> Option<&str> {
        match &self.session {
            Session::Create(_) => None,
            Session::Edit(edit) => Some(&edit.group.id),
        }
    }

    pub fn details(&self) -> &GroupDetails {
        match &self.session {
            Session::Create(history) => &history.current().details,
            Session::Edit(edit) => &edit.history.current().details,
        }
    }

    /// Pending changes in edit mode.
    pub fn edit_log(&self) -> Option<&EditLog> {
        match &self.session {
            Session::Create(_) => None,
            Session::Edit(edit) => Some(&edit.history.current().log),
        }
    }

    // ==================== VIEW ====================

    /// Current pagination, sort and settled search.
    pub fn query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            page_size: self.page_size,
            sort_field: self.sort_field,
            sort_order: self.sort_order,
            search: self.search.settled().clone(),
        }
    }

    /// The members to render and the total for the pager.
    pub fn visible(&self) -> MemberView {
        match &self.session {
            Session::Create(history) => project_create(&history.current().members, &self.query()),
            Session::Edit(edit) => project_edit(&edit.base, &edit.history.current().log),
        }
    }

    /// Members the client currently knows about, with pending edits applied.
    fn known_members(&self) -> Vec<GroupMember> {
        match &self.session {
            Session::Create(history) => history.current().members.clone(),
            Session::Edit(edit) => project_edit(&edit.base, &edit.history.current().log).members,
        }
    }

    pub fn is_phone_number_taken(&self, candidate: &str, exclude_id: Option<&str>) -> bool {
        validation::is_phone_number_taken(&self.known_members(), candidate, exclude_id)
    }

    /// Returns whether the page changed; in edit mode the caller then refreshes.
    pub fn set_page(&mut self, page: usize) -> bool {
        if page == self.page {
            return false;
        }
        self.page = page;
        true
    }

    pub fn set_page_size(&mut self, page_size: usize) -> bool {
        let page_size = page_size.max(1);
        if page_size == self.page_size {
            return false;
        }
        self.page_size = page_size;
        self.page = 0;
        true
    }

    pub fn set_sort(&mut self, field: Option<MemberField>, order: SortOrder) -> bool {
        if field == self.sort_field && order == self.sort_order {
            return false;
        }
        self.sort_field = field;
        self.sort_order = order;
        self.page = 0;
        true
    }

    /// Text as typed in the search box.
    pub fn search_input(&self) -> &str {
        self.search.input()
    }

    pub fn set_search_input(&mut self, text: impl Into<String>, now: Instant) {
        self.search.set(text.into(), now);
    }

    /// Settle the search box if it has been quiet long enough.
    ///
    /// Returns whether the settled search changed, in which case the page is
    /// reset and, in edit mode, the caller refreshes.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.search.tick(now) {
            return false;
        }
        tracing::debug!("Search settled on {:?}", self.search.settled());
        self.page = 0;
        true
    }

    /// Wait out the debounce delay, settle the search and reload if needed.
    pub async fn settle_search(&mut self) -> bool {
        if let Some(deadline) = self.search.deadline() {
            tokio::time::sleep_until(deadline).await;
        }
        if !self.tick(Instant::now()) {
            return false;
        }
        if self.is_edit_mode() {
            self.refresh().await;
        }
        true
    }

    // ==================== FETCH ====================

    /// Issue a fetch for the current parameters. `None` in create mode.
    pub fn begin_fetch(&mut self) -> Option<PendingFetch> {
        let query = self.query();
        let Session::Edit(edit) = &mut self.session else {
            return None;
        };
        edit.issued += 1;
        Some(PendingFetch {
            generation: edit.issued,
            group_id: edit.group.id.clone(),
            query,
            source: Arc::clone(&edit.source),
        })
    }

    /// Apply a finished fetch unless a newer one has been issued since.
    ///
    /// A failed fetch clears the list and raises a banner.
    pub fn finish_fetch(&mut self, fetched: FetchResult) -> bool {
        let Session::Edit(edit) = &mut self.session else {
            return false;
        };
        if fetched.generation != edit.issued {
            tracing::debug!(
                "Dropping stale member page (generation {}, latest {})",
                fetched.generation,
                edit.issued
            );
            return false;
        }
        edit.completed = fetched.generation;

        match fetched.result {
            Ok(page) => {
                tracing::debug!(
                    "Loaded {} members ({} total) for group {}",
                    page.members.len(),
                    page.total_count,
                    edit.group.id
                );
                edit.base = page;
                if matches!(&self.banner, Some(banner) if banner.kind == BannerKind::Fetch) {
                    self.banner = None;
                }
            }
            Err(err) => {
                tracing::warn!("Failed to load members of group {}: {}", edit.group.id, err);
                edit.base = MemberPage::default();
                self.banner = Some(Banner {
                    kind: BannerKind::Fetch,
                    message: err.message().to_string(),
                });
            }
        }
        true
    }

    /// Fetch and apply the page for the current parameters.
    pub async fn refresh(&mut self) -> bool {
        let Some(pending) = self.begin_fetch() else {
            return false;
        };
        let fetched = pending.run().await;
        self.finish_fetch(fetched)
    }

    /// Whether the latest issued fetch is still outstanding.
    pub fn is_loading(&self) -> bool {
        match &self.session {
            Session::Create(_) => false,
            Session::Edit(edit) => edit.completed < edit.issued,
        }
    }

    // ==================== MUTATIONS ====================

    /// Add a member. Returns the inline errors if validation fails.
    pub fn add_member(&mut self, data: NewMemberData) -> Result<bool, Vec<FieldError>> {
        let data = normalize(data);
        validation::validate_member(&data, &self.known_members(), None)?;

        tracing::debug!("Adding member with phone {}", data.phone_number);
        let recorded = match &mut self.session {
            Session::Create(history) => history.commit_with(|state| state.with_added(data)),
            Session::Edit(edit) => edit.history.commit_with(|state| EditState {
                details: state.details.clone(),
                log: state.log.with(EditOperation::Add(data)),
            }),
        };
        Ok(recorded)
    }

    /// Replace the fields of member `id` with `edited`.
    ///
    /// Only the fields that differ from what is currently displayed are
    /// recorded. Returns `Ok(false)` when nothing changed or the member is not
    /// loaded.
    pub fn update_member(&mut self, id: &str, edited: NewMemberData) -> Result<bool, Vec<FieldError>> {
        let edited = normalize(edited);
        let members = self.known_members();
        let Some(original) = members.iter().find(|member| member.id == id) else {
            tracing::warn!("Ignoring edit of member {} which is not loaded", id);
            return Ok(false);
        };
        validation::validate_member(&edited, &members, Some(id))?;

        let patch = compute_changes(
            original,
            &GroupMember::from_new(id, edited),
            MemberField::Id,
        );
        if patch.is_empty() {
            tracing::debug!("Edit of member {} changed nothing", id);
            return Ok(false);
        }

        tracing::debug!("Updating member {} fields {:?}", id, patch.fields());
        let recorded = match &mut self.session {
            Session::Create(history) => history.commit_with(|state| state.with_updated(id, &patch)),
            Session::Edit(edit) => {
                let persisted = edit.base.members.iter().find(|member| member.id == id);
                edit.history.commit_with(|state| {
                    let mut log = state
                        .log
                        .with(EditOperation::Update(id.to_string(), patch));
                    // Reverting a field to its saved value leaves nothing to send
                    if let Some(persisted) = persisted {
                        log.prune_update(id, persisted);
                    }
                    EditState {
                        details: state.details.clone(),
                        log,
                    }
                })
            }
        };
        Ok(recorded)
    }

    /// Remove member `id`. Returns whether anything changed.
    pub fn remove_member(&mut self, id: &str) -> bool {
        if !self.known_members().iter().any(|member| member.id == id) {
            return false;
        }
        tracing::debug!("Removing member {}", id);
        match &mut self.session {
            Session::Create(history) => history.commit_with(|state| state.with_removed(id)),
            Session::Edit(edit) => edit.history.commit_with(|state| EditState {
                details: state.details.clone(),
                log: state.log.with(EditOperation::Remove(id.to_string())),
            }),
        }
    }

    /// Rename the group or change its description.
    pub fn set_details(&mut self, name: impl Into<String>, description: impl Into<String>) -> bool {
        let details = GroupDetails {
            name: name.into(),
            description: description.into(),
        };
        match &mut self.session {
            Session::Create(history) => history.commit_with(|state| CreateState {
                details,
                members: state.members.clone(),
            }),
            Session::Edit(edit) => edit.history.commit_with(|state| EditState {
                details,
                log: state.log.clone(),
            }),
        }
    }

    // ==================== HISTORY ====================

    pub fn undo(&mut self) -> bool {
        match &mut self.session {
            Session::Create(history) => history.undo(),
            Session::Edit(edit) => edit.history.undo(),
        }
    }

    pub fn redo(&mut self) -> bool {
        match &mut self.session {
            Session::Create(history) => history.redo(),
            Session::Edit(edit) => edit.history.redo(),
        }
    }

    pub fn can_undo(&self) -> bool {
        match &self.session {
            Session::Create(history) => history.can_undo(),
            Session::Edit(edit) => edit.history.can_undo(),
        }
    }

    pub fn can_redo(&self) -> bool {
        match &self.session {
            Session::Create(history) => history.can_redo(),
            Session::Edit(edit) => edit.history.can_redo(),
        }
    }

    /// Number of entries in the undo/redo stack.
    pub fn history_len(&self) -> usize {
        match &self.session {
            Session::Create(history) => history.len(),
            Session::Edit(edit) => edit.history.len(),
        }
    }

    /// Whether the draft differs from what the session started with.
    pub fn has_changes(&self) -> bool {
        match &self.session {
            Session::Create(history) => history.current() != history.baseline(),
            Session::Edit(edit) => !edit_changes(edit).is_empty(),
        }
    }

    // ==================== PHOTOS ====================

    /// Upload an identity photo into one slot of a member form.
    pub async fn upload_photo(
        &self,
        form: &mut MemberForm,
        slot: PhotoSlot,
        file: PhotoFile,
    ) -> Result<String, UploadError> {
        form.upload(self.collaborators.uploader.as_ref(), slot, file)
            .await
    }

    // ==================== SUBMIT ====================

    /// What would be handed to the submitter right now.
    pub fn draft(&self) -> GroupDraft {
        match &self.session {
            Session::Create(history) => {
                let state = history.current();
                GroupDraft::Create(NewGroup {
                    name: state.details.name.trim().to_string(),
                    description: state.details.description.trim().to_string(),
                    members: state.members.iter().map(GroupMember::to_new).collect(),
                })
            }
            Session::Edit(edit) => GroupDraft::Edit {
                group_id: edit.group.id.clone(),
                changes: edit_changes(edit),
            },
        }
    }

    /// Validate the draft and mark the session as submitting.
    pub fn begin_submit(&mut self) -> Result<PendingSubmit, SubmitError> {
        if self.submitting {
            return Err(SubmitError::InProgress);
        }
        if self.details().name.trim().is_empty() {
            return Err(SubmitError::NameRequired);
        }
        let draft = self.draft();
        if let GroupDraft::Edit { changes, .. } = &draft {
            if changes.is_empty() {
                return Err(SubmitError::NoChanges);
            }
        }
        self.submitting = true;
        Ok(PendingSubmit {
            draft,
            submitter: Arc::clone(&self.collaborators.submitter),
        })
    }

    /// Apply the outcome of a submission.
    ///
    /// Success discards the history and starts over from the saved group.
    /// Failure keeps the draft intact for a retry and raises a banner.
    pub fn finish_submit(&mut self, result: Result<Group, AppError>) -> Result<Group, SubmitError> {
        self.submitting = false;
        match result {
            Ok(group) => {
                tracing::info!("Saved group {} ({})", group.name, group.id);
                if matches!(&self.banner, Some(banner) if banner.kind == BannerKind::Submit) {
                    self.banner = None;
                }
                match &mut self.session {
                    Session::Create(history) => history.reset(CreateState::default()),
                    Session::Edit(edit) => {
                        edit.history.reset(EditState {
                            details: GroupDetails {
                                name: group.name.clone(),
                                description: group.description.clone(),
                            },
                            log: EditLog::new(),
                        });
                        edit.group = group.clone();
                    }
                }
                Ok(group)
            }
            Err(err) => {
                tracing::warn!("Group submission failed: {}", err);
                self.banner = Some(Banner {
                    kind: BannerKind::Submit,
                    message: err.message().to_string(),
                });
                Err(SubmitError::Rejected(err))
            }
        }
    }

    /// Submit the draft; in edit mode the member page is reloaded afterwards.
    pub async fn submit(&mut self) -> Result<Group, SubmitError> {
        let pending = self.begin_submit()?;
        let result = pending.run().await;
        let group = self.finish_submit(result)?;
        if self.is_edit_mode() {
            self.refresh().await;
        }
        Ok(group)
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    // ==================== BANNER ====================

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }
}

fn edit_changes(edit: &EditSession) -> GroupChanges {
    let state = edit.history.current();
    let name = state.details.name.trim();
    let description = state.details.description.trim();
    GroupChanges {
        name: (name != edit.group.name).then(|| name.to_string()),
        description: (description != edit.group.description).then(|| description.to_string()),
        added_members: state.log.added().to_vec(),
        updated_members: state.log.updated().clone(),
        deleted_member_ids: state.log.deleted().iter().cloned().collect(),
    }
}

fn normalize(data: NewMemberData) -> NewMemberData {
    NewMemberData {
        full_name: data.full_name.trim().to_string(),
        national_id: data.national_id.trim().to_string(),
        phone_number: data.phone_number.trim().to_string(),
        ..data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::errors::FieldErrorKind;
    use crate::models::MemberRole;

    use super::super::collab::PhotoUploader;

    /// Serves pages out of a fixed member list, filtering like create mode does.
    struct MemorySource {
        members: Vec<GroupMember>,
        fail: Mutex<bool>,
        queries: Mutex<Vec<PageQuery>>,
    }

    impl MemorySource {
        fn new(members: Vec<GroupMember>) -> Arc<Self> {
            Arc::new(Self {
                members,
                fail: Mutex::new(false),
                queries: Mutex::new(Vec::new()),
            })
        }

        fn set_failing(&self, fail: bool) {
            *self.fail.lock().unwrap() = fail;
        }
    }

    #[async_trait]
    impl MemberSource for MemorySource {
        async fn fetch_members_page(
            &self,
            _group_id: &str,
            query: &PageQuery,
        ) -> Result<MemberPage, AppError> {
            self.queries.lock().unwrap().push(query.clone());
            if *self.fail.lock().unwrap() {
                return Err(AppError::Network("Service unreachable".to_string()));
            }
            let view = project_create(&self.members, query);
            Ok(MemberPage {
                members: view.members,
                total_count: view.total_count,
            })
        }
    }

    struct RecordingSubmitter {
        fail: Mutex<bool>,
        drafts: Mutex<Vec<GroupDraft>>,
    }

    impl RecordingSubmitter {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                fail: Mutex::new(false),
                drafts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl GroupSubmitter for RecordingSubmitter {
        async fn submit(&self, draft: GroupDraft) -> Result<Group, AppError> {
            self.drafts.lock().unwrap().push(draft.clone());
            if *self.fail.lock().unwrap() {
                return Err(AppError::Network("Service unreachable".to_string()));
            }
            let (id, name, description) = match draft {
                GroupDraft::Create(group) => ("g-new".to_string(), group.name, group.description),
                GroupDraft::Edit { group_id, changes } => (
                    group_id,
                    changes.name.unwrap_or_else(|| "Harambee".to_string()),
                    changes.description.unwrap_or_default(),
                ),
            };
            Ok(Group {
                id,
                name,
                description,
                created_at: "2026-01-01T00:00:00Z".to_string(),
                updated_at: "2026-01-02T00:00:00Z".to_string(),
            })
        }
    }

    struct NullUploader;

    #[async_trait]
    impl PhotoUploader for NullUploader {
        async fn upload_photo(&self, slot: PhotoSlot, _file: PhotoFile) -> Result<String, AppError> {
            Ok(format!("https://cdn/{}.png", slot))
        }
    }

    fn collaborators(submitter: Arc<RecordingSubmitter>) -> Collaborators {
        Collaborators::new(Arc::new(NullUploader), submitter)
    }

    fn new_member(name: &str, phone: &str) -> NewMemberData {
        NewMemberData {
            full_name: name.to_string(),
            phone_number: phone.to_string(),
            ..Default::default()
        }
    }

    fn persisted(count: usize) -> Vec<GroupMember> {
        (0..count)
            .map(|i| {
                GroupMember::from_new(
                    format!("m{}", i),
                    NewMemberData {
                        full_name: format!("Member {}", i),
                        national_id: format!("{}", 1000 + i),
                        role: MemberRole::Member,
                        phone_number: format!("07{:02}", i),
                        id_front_url: None,
                        id_back_url: None,
                    },
                )
            })
            .collect()
    }

    fn group() -> Group {
        Group {
            id: "g1".to_string(),
            name: "Harambee".to_string(),
            description: "Savings circle".to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn create_editor() -> (GroupEditor, Arc<RecordingSubmitter>) {
        let submitter = RecordingSubmitter::new();
        let editor = GroupEditor::create(
            collaborators(submitter.clone()),
            &EditorSettings::default(),
            GroupDetails::default(),
        );
        (editor, submitter)
    }

    fn edit_editor(
        members: Vec<GroupMember>,
        page_size: usize,
    ) -> (GroupEditor, Arc<MemorySource>, Arc<RecordingSubmitter>) {
        let source = MemorySource::new(members);
        let submitter = RecordingSubmitter::new();
        let settings = EditorSettings {
            page_size,
            ..Default::default()
        };
        let editor = GroupEditor::edit(
            group(),
            source.clone(),
            collaborators(submitter.clone()),
            &settings,
        );
        (editor, source, submitter)
    }

    #[test]
    fn test_add_then_undo_redo() {
        let (mut editor, _) = create_editor();
        assert!(editor.add_member(new_member("A", "700")).unwrap());

        editor.undo();
        assert!(editor.visible().members.is_empty());

        editor.redo();
        let view = editor.visible();
        assert_eq!(view.members.len(), 1);
        assert_eq!(view.members[0].full_name, "A");
        assert_eq!(view.members[0].phone_number, "700");
    }

    #[test]
    fn test_add_rejects_duplicate_and_missing_fields() {
        let (mut editor, _) = create_editor();
        editor.add_member(new_member("A", "700")).unwrap();

        let errors = editor.add_member(new_member("", "700")).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, MemberField::FullName);
        assert_eq!(errors[1].kind, FieldErrorKind::DuplicatePhone);
        assert_eq!(editor.history_len(), 2);
    }

    #[test]
    fn test_phone_taken_excludes_member_being_edited() {
        let (mut editor, _) = create_editor();
        editor.add_member(new_member("A", "700")).unwrap();
        editor.add_member(new_member("B", "701")).unwrap();

        assert!(editor.is_phone_number_taken("700", None));
        assert!(!editor.is_phone_number_taken("700", Some("temp-700")));
    }

    #[test]
    fn test_noop_edit_is_not_recorded() {
        let (mut editor, _) = create_editor();
        editor.add_member(new_member("A", "700")).unwrap();
        let len = editor.history_len();

        assert!(!editor.update_member("temp-700", new_member("A ", "700")).unwrap());
        assert_eq!(editor.history_len(), len);
        assert!(!editor.can_redo());
    }

    #[test]
    fn test_create_edit_changes_phone_and_id() {
        let (mut editor, _) = create_editor();
        editor.add_member(new_member("A", "700")).unwrap();
        editor.add_member(new_member("B", "701")).unwrap();

        // Taking B's number is refused, a fresh one is fine
        assert!(editor.update_member("temp-700", new_member("A", "701")).is_err());
        assert!(editor.update_member("temp-700", new_member("A", "702")).unwrap());

        let ids: Vec<_> = editor.visible().members.into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["temp-702", "temp-701"]);
    }

    #[test]
    fn test_rename_then_undo() {
        let (mut editor, _) = create_editor();
        assert!(editor.set_details("Harambee", ""));
        assert!(!editor.set_details("Harambee", ""));
        assert!(editor.has_changes());
        editor.undo();
        assert_eq!(editor.details().name, "");
        assert!(!editor.has_changes());
    }

    #[test]
    fn test_create_search_and_pagination() {
        let (mut editor, _) = create_editor();
        for i in 0..120 {
            editor
                .add_member(new_member(&format!("Member {}", i), &format!("7{:03}", i)))
                .unwrap();
        }
        editor.set_page_size(50);
        assert_eq!(editor.visible().members.len(), 50);
        editor.set_page(2);
        let view = editor.visible();
        assert_eq!(view.members.len(), 20);
        assert_eq!(view.total_count, 120);

        let start = Instant::now();
        editor.set_search_input("nobody", start);
        assert_eq!(editor.visible().total_count, 120);
        assert!(editor.tick(start + Duration::from_millis(500)));
        let view = editor.visible();
        assert!(view.members.is_empty());
        assert_eq!(view.total_count, 0);
        assert_eq!(editor.query().page, 0);
    }

    #[tokio::test]
    async fn test_create_submit() {
        let (mut editor, submitter) = create_editor();
        editor.add_member(new_member("A", "700")).unwrap();

        assert_eq!(editor.submit().await.unwrap_err(), SubmitError::NameRequired);
        assert!(submitter.drafts.lock().unwrap().is_empty());

        editor.set_details(" Harambee ", "Weekly savings");
        let group = editor.submit().await.unwrap();
        assert_eq!(group.id, "g-new");

        let drafts = submitter.drafts.lock().unwrap();
        match &drafts[0] {
            GroupDraft::Create(new_group) => {
                assert_eq!(new_group.name, "Harambee");
                assert_eq!(new_group.members, vec![new_member("A", "700")]);
            }
            other => panic!("unexpected draft {:?}", other),
        }
        drop(drafts);

        assert!(!editor.can_undo());
        assert!(editor.visible().members.is_empty());
    }

    #[tokio::test]
    async fn test_edit_mode_total_count() {
        let (mut editor, _, _) = edit_editor(persisted(10), 50);
        assert!(editor.refresh().await);
        assert_eq!(editor.visible().total_count, 10);

        editor.add_member(new_member("New", "0799")).unwrap();
        assert!(editor.remove_member("m3"));

        let view = editor.visible();
        assert_eq!(view.total_count, 10);
        assert_eq!(view.members[0].id, "temp-0799");
        assert!(view.members.iter().all(|m| m.id != "m3"));
    }

    #[tokio::test]
    async fn test_edit_updates_merge_per_member() {
        let (mut editor, _, _) = edit_editor(persisted(3), 50);
        editor.refresh().await;

        let mut edited = persisted(3)[1].to_new();
        edited.full_name = "Renamed".to_string();
        assert!(editor.update_member("m1", edited.clone()).unwrap());

        edited.role = MemberRole::Treasurer;
        assert!(editor.update_member("m1", edited).unwrap());

        let log = editor.edit_log().unwrap();
        let patch = &log.updated()["m1"];
        assert_eq!(patch.full_name.as_deref(), Some("Renamed"));
        assert_eq!(patch.role, Some(MemberRole::Treasurer));
        assert_eq!(patch.fields().len(), 2);

        let shown = editor.visible().members[1].clone();
        assert_eq!(shown.full_name, "Renamed");
        assert_eq!(shown.role, MemberRole::Treasurer);
    }

    #[tokio::test]
    async fn test_edit_of_added_member_patches_addition() {
        let (mut editor, _, _) = edit_editor(persisted(2), 50);
        editor.refresh().await;
        editor.add_member(new_member("New", "0799")).unwrap();
        assert!(editor.update_member("temp-0799", new_member("Newer", "0799")).unwrap());

        let log = editor.edit_log().unwrap();
        assert!(log.updated().is_empty());
        assert_eq!(log.added()[0].full_name, "Newer");
    }

    #[tokio::test]
    async fn test_edit_undo_redo_remove_and_update() {
        let (mut editor, _, _) = edit_editor(persisted(3), 50);
        editor.refresh().await;

        assert!(editor.remove_member("m1"));
        assert_eq!(editor.visible().members.len(), 2);

        assert!(editor.undo());
        let view = editor.visible();
        assert_eq!(view.members.len(), 3);
        assert_eq!(view.members[1], persisted(3)[1]);
        assert!(editor.can_redo());

        assert!(editor.redo());
        assert_eq!(editor.visible().members.len(), 2);
        assert!(editor.visible().members.iter().all(|m| m.id != "m1"));

        let mut edited = persisted(3)[0].to_new();
        edited.full_name = "Renamed".to_string();
        assert!(editor.update_member("m0", edited).unwrap());
        assert_eq!(editor.visible().members[0].full_name, "Renamed");

        // Same details over a log holding a map and a set commits nothing
        let len = editor.history_len();
        assert!(!editor.set_details("Harambee", "Savings circle"));
        assert_eq!(editor.history_len(), len);
        assert!(!editor.can_redo());

        assert!(editor.undo());
        assert_eq!(editor.visible().members[0], persisted(3)[0]);
        let log = editor.edit_log().unwrap();
        assert!(log.updated().is_empty());
        assert!(log.is_deleted("m1"));

        assert!(editor.undo());
        assert!(!editor.has_changes());
        assert_eq!(editor.visible().members, persisted(3));

        assert!(editor.redo());
        assert!(editor.redo());
        assert!(!editor.redo());
        let view = editor.visible();
        assert_eq!(view.members.len(), 2);
        assert_eq!(view.members[0].full_name, "Renamed");
    }

    #[tokio::test]
    async fn test_edit_reverted_to_saved_value_is_not_pending() {
        let (mut editor, _, _) = edit_editor(persisted(2), 50);
        editor.refresh().await;

        let mut edited = persisted(2)[0].to_new();
        edited.full_name = "Renamed".to_string();
        edited.role = MemberRole::Chair;
        assert!(editor.update_member("m0", edited.clone()).unwrap());

        edited.full_name = "Member 0".to_string();
        assert!(editor.update_member("m0", edited.clone()).unwrap());
        let patch = &editor.edit_log().unwrap().updated()["m0"];
        assert_eq!(patch.full_name, None);
        assert_eq!(patch.role, Some(MemberRole::Chair));

        edited.role = MemberRole::Member;
        assert!(editor.update_member("m0", edited).unwrap());
        assert!(editor.edit_log().unwrap().updated().is_empty());
        assert!(!editor.has_changes());
        assert!(matches!(editor.begin_submit(), Err(SubmitError::NoChanges)));
    }

    #[tokio::test]
    async fn test_edit_phone_conflict_uses_pending_update() {
        let (mut editor, _, _) = edit_editor(persisted(2), 50);
        editor.refresh().await;

        let mut edited = persisted(2)[0].to_new();
        edited.phone_number = "0777".to_string();
        editor.update_member("m0", edited).unwrap();

        // m0's old number is free again, its new one is taken
        assert!(!editor.is_phone_number_taken("0700", None));
        assert!(editor.is_phone_number_taken("0777", None));
        assert!(!editor.is_phone_number_taken("0777", Some("m0")));
    }

    #[tokio::test]
    async fn test_off_page_edit_kept_for_submission() {
        let (mut editor, _, submitter) = edit_editor(persisted(4), 2);
        editor.refresh().await;

        let mut edited = persisted(4)[0].to_new();
        edited.full_name = "First".to_string();
        editor.update_member("m0", edited).unwrap();

        editor.set_page(1);
        editor.refresh().await;
        let names: Vec<_> = editor.visible().members.into_iter().map(|m| m.full_name).collect();
        assert_eq!(names, vec!["Member 2", "Member 3"]);

        editor.submit().await.unwrap();
        let drafts = submitter.drafts.lock().unwrap();
        let GroupDraft::Edit { changes, .. } = &drafts[0] else {
            panic!("expected edit draft");
        };
        assert_eq!(changes.updated_members["m0"].full_name.as_deref(), Some("First"));
        assert_eq!(changes.name, None);
    }

    #[tokio::test]
    async fn test_stale_fetch_is_dropped() {
        let (mut editor, _, _) = edit_editor(persisted(4), 2);

        let first = editor.begin_fetch().unwrap();
        editor.set_page(1);
        let second = editor.begin_fetch().unwrap();
        assert!(editor.is_loading());

        let second_result = second.run().await;
        let first_result = first.run().await;

        assert!(editor.finish_fetch(second_result));
        assert!(!editor.is_loading());
        assert!(!editor.finish_fetch(first_result));

        let ids: Vec<_> = editor.visible().members.into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["m2", "m3"]);
    }

    #[tokio::test]
    async fn test_stale_fetch_finishing_first_is_dropped() {
        let (mut editor, _, _) = edit_editor(persisted(4), 2);

        let first = editor.begin_fetch().unwrap();
        editor.set_page(1);
        let second = editor.begin_fetch().unwrap();

        assert!(!editor.finish_fetch(first.run().await));
        assert!(editor.is_loading());
        assert!(editor.finish_fetch(second.run().await));
        assert_eq!(editor.visible().members[0].id, "m2");
    }

    #[tokio::test]
    async fn test_fetch_error_clears_list_and_raises_banner() {
        let (mut editor, source, _) = edit_editor(persisted(3), 50);
        editor.refresh().await;
        assert_eq!(editor.visible().members.len(), 3);

        source.set_failing(true);
        editor.refresh().await;
        let view = editor.visible();
        assert!(view.members.is_empty());
        assert_eq!(view.total_count, 0);
        assert_eq!(editor.banner().unwrap().kind, BannerKind::Fetch);

        source.set_failing(false);
        editor.refresh().await;
        assert!(editor.banner().is_none());
        assert_eq!(editor.visible().members.len(), 3);
    }

    #[tokio::test]
    async fn test_submit_failure_keeps_draft() {
        let (mut editor, _, submitter) = edit_editor(persisted(3), 50);
        editor.refresh().await;

        assert_eq!(editor.submit().await.unwrap_err(), SubmitError::NoChanges);

        editor.set_details("Harambee Plus", "Savings circle");
        editor.remove_member("m2");
        *submitter.fail.lock().unwrap() = true;

        let err = editor.submit().await.unwrap_err();
        assert!(matches!(err, SubmitError::Rejected(AppError::Network(_))));
        assert_eq!(editor.banner().unwrap().kind, BannerKind::Submit);
        assert!(editor.can_undo());
        assert!(editor.has_changes());
        assert!(!editor.is_submitting());

        *submitter.fail.lock().unwrap() = false;
        let group = editor.submit().await.unwrap();
        assert_eq!(group.name, "Harambee Plus");
        assert!(editor.banner().is_none());
        assert!(!editor.can_undo());
        assert!(!editor.has_changes());

        let drafts = submitter.drafts.lock().unwrap();
        let GroupDraft::Edit { group_id, changes } = &drafts[1] else {
            panic!("expected edit draft");
        };
        assert_eq!(group_id, "g1");
        assert_eq!(changes.name.as_deref(), Some("Harambee Plus"));
        assert_eq!(changes.description, None);
        assert_eq!(changes.deleted_member_ids, vec!["m2".to_string()]);
    }

    #[tokio::test]
    async fn test_second_submit_while_pending_is_refused() {
        let (mut editor, _) = create_editor();
        editor.set_details("Harambee", "");
        let pending = editor.begin_submit().unwrap();
        assert!(editor.is_submitting());
        assert!(matches!(editor.begin_submit(), Err(SubmitError::InProgress)));

        let result = pending.run().await;
        editor.finish_submit(result).unwrap();
        assert!(!editor.is_submitting());
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_search_refetches_with_settled_text() {
        let (mut editor, source, _) = edit_editor(persisted(12), 5);
        editor.refresh().await;
        editor.set_page(1);

        editor.set_search_input("member 1", Instant::now());
        assert_eq!(editor.search_input(), "member 1");
        assert!(editor.settle_search().await);

        let queries = source.queries.lock().unwrap();
        let last = queries.last().unwrap();
        assert_eq!(last.search, "member 1");
        assert_eq!(last.page, 0);
        drop(queries);

        // Member 1, Member 10, Member 11
        assert_eq!(editor.visible().total_count, 3);
    }

    #[tokio::test]
    async fn test_upload_photo_goes_through_uploader() {
        let (editor, _) = create_editor();
        let mut form = MemberForm::new();
        let file = PhotoFile {
            file_name: "id.png".to_string(),
            content_type: None,
            bytes: vec![0; 4],
        };
        let url = editor
            .upload_photo(&mut form, PhotoSlot::Back, file)
            .await
            .unwrap();
        assert_eq!(url, "https://cdn/back.png");
        assert_eq!(form.data.id_back_url.as_deref(), Some("https://cdn/back.png"));
    }
}
