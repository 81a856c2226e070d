//! Group and member API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{Group, GroupChanges, MemberPage, NewGroup, PageQuery};
use crate::AppState;

/// POST /api/groups - Create a group with its initial members.
pub async fn create_group(
    State(state): State<AppState>,
    Json(request): Json<NewGroup>,
) -> ApiResult<Group> {
    success(state.repo.create_group(&request).await?)
}

/// GET /api/groups/:id - Get a single group.
pub async fn get_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Group> {
    match state.repo.get_group(&id).await? {
        Some(group) => success(group),
        None => Err(AppError::NotFound(format!("Group {} not found", id))),
    }
}

/// PATCH /api/groups/:id - Apply pending edits in one transaction.
pub async fn update_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(changes): Json<GroupChanges>,
) -> ApiResult<Group> {
    if changes.is_empty() {
        return Err(AppError::Validation("No changes to apply".to_string()));
    }

    success(state.repo.apply_group_changes(&id, &changes).await?)
}

/// GET /api/groups/:id/members - One page of members.
pub async fn list_group_members(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<MemberPage> {
    if query.page_size == 0 {
        return Err(AppError::BadRequest(
            "pageSize must be at least 1".to_string(),
        ));
    }

    if state.repo.get_group(&id).await?.is_none() {
        return Err(AppError::NotFound(format!("Group {} not found", id)));
    }

    success(state.repo.list_members_page(&id, &query).await?)
}
