//! Database repository for groups and their members.
//!
//! Uses prepared statements and transactions for data integrity.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::editor::validation::missing_fields;
use crate::editor::{GroupSubmitter, MemberSource};
use crate::errors::AppError;
use crate::models::{
    Group, GroupChanges, GroupDraft, GroupMember, MemberPage, MemberRole, NewGroup,
    NewMemberData, PageQuery, SortOrder,
};

const MEMBER_COLUMNS: &str =
    "id, full_name, national_id, role, phone_number, id_front_url, id_back_url";

/// Substring match over every text column ignoring ASCII case; `?2` is the
/// ASCII-lowercased search term, empty for no filter.
const MEMBER_FILTER: &str = "group_id = ?1 AND (?2 = '' \
    OR instr(lower(id), ?2) > 0 \
    OR instr(lower(full_name), ?2) > 0 \
    OR instr(lower(national_id), ?2) > 0 \
    OR instr(lower(role), ?2) > 0 \
    OR instr(lower(phone_number), ?2) > 0 \
    OR instr(lower(coalesce(id_front_url, '')), ?2) > 0 \
    OR instr(lower(coalesce(id_back_url, '')), ?2) > 0)";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== GROUP OPERATIONS ====================

    /// Get a group by ID.
    pub async fn get_group(&self, id: &str) -> Result<Option<Group>, AppError> {
        let row = sqlx::query(
            "SELECT id, name, description, created_at, updated_at FROM groups WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(group_from_row))
    }

    /// Create a group together with its initial members.
    pub async fn create_group(&self, request: &NewGroup) -> Result<Group, AppError> {
        check_group_name(&request.name)?;
        for member in &request.members {
            check_member(member)?;
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let name = request.name.trim();
        let description = request.description.trim();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO groups (id, name, description, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(name)
        .bind(description)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        for member in &request.members {
            insert_member(&mut tx, &id, member, &now).await?;
        }

        tx.commit().await?;

        tracing::info!(
            "Created group {} with {} members",
            id,
            request.members.len()
        );

        Ok(Group {
            id,
            name: name.to_string(),
            description: description.to_string(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Apply a batch of pending changes to a group atomically.
    ///
    /// Deletions run before updates and additions so a removed member's
    /// phone number can be reused in the same batch.
    pub async fn apply_group_changes(
        &self,
        group_id: &str,
        changes: &GroupChanges,
    ) -> Result<Group, AppError> {
        if let Some(name) = &changes.name {
            check_group_name(name)?;
        }
        for member in &changes.added_members {
            check_member(member)?;
        }

        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query("SELECT name, description FROM groups WHERE id = ?")
            .bind(group_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Group {} not found", group_id)))?;

        let current_name: String = existing.get("name");
        let current_description: String = existing.get("description");
        let name = changes
            .name
            .as_deref()
            .map(str::trim)
            .unwrap_or(&current_name);
        let description = changes
            .description
            .as_deref()
            .map(str::trim)
            .unwrap_or(&current_description);

        sqlx::query("UPDATE groups SET name = ?, description = ?, updated_at = ? WHERE id = ?")
            .bind(name)
            .bind(description)
            .bind(&now)
            .bind(group_id)
            .execute(&mut *tx)
            .await?;

        for member_id in &changes.deleted_member_ids {
            let result = sqlx::query("DELETE FROM group_members WHERE id = ? AND group_id = ?")
                .bind(member_id)
                .bind(group_id)
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() == 0 {
                tracing::debug!("Member {} was already gone from group {}", member_id, group_id);
            }
        }

        for (member_id, patch) in &changes.updated_members {
            let row = sqlx::query(&format!(
                "SELECT {} FROM group_members WHERE id = ? AND group_id = ?",
                MEMBER_COLUMNS
            ))
            .bind(member_id)
            .bind(group_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member {} not found", member_id)))?;

            let mut member = member_from_row(&row);
            patch.apply_to(&mut member);
            check_member(&member.to_new())?;

            sqlx::query(
                "UPDATE group_members SET full_name = ?, national_id = ?, role = ?, phone_number = ?, id_front_url = ?, id_back_url = ? WHERE id = ?",
            )
            .bind(member.full_name.trim())
            .bind(member.national_id.trim())
            .bind(member.role.as_str())
            .bind(member.phone_number.trim())
            .bind(&member.id_front_url)
            .bind(&member.id_back_url)
            .bind(member_id)
            .execute(&mut *tx)
            .await?;
        }

        for member in &changes.added_members {
            insert_member(&mut tx, group_id, member, &now).await?;
        }

        tx.commit().await?;

        tracing::info!(
            "Applied changes to group {}: {} added, {} updated, {} deleted",
            group_id,
            changes.added_members.len(),
            changes.updated_members.len(),
            changes.deleted_member_ids.len()
        );

        self.get_group(group_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Group {} not found", group_id)))
    }

    // ==================== MEMBER OPERATIONS ====================

    /// One page of a group's members for the given filter and sort.
    pub async fn list_members_page(
        &self,
        group_id: &str,
        query: &PageQuery,
    ) -> Result<MemberPage, AppError> {
        // SQLite's lower() folds ASCII only, so the term must match it
        let search = query.search.trim().to_ascii_lowercase();
        let limit = i64::try_from(query.page_size)
            .map_err(|_| AppError::BadRequest("pageSize is too large".to_string()))?;
        let offset = query
            .page
            .checked_mul(query.page_size)
            .and_then(|offset| i64::try_from(offset).ok())
            .ok_or_else(|| AppError::BadRequest("page is out of range".to_string()))?;

        let total: i64 = sqlx::query(&format!(
            "SELECT COUNT(*) AS total FROM group_members WHERE {}",
            MEMBER_FILTER
        ))
        .bind(group_id)
        .bind(&search)
        .fetch_one(&self.pool)
        .await?
        .get("total");

        // Sort columns come from a closed enum, never from raw input
        let order = match query.sort_field {
            Some(field) => {
                let direction = match query.sort_order {
                    SortOrder::Asc => "ASC",
                    SortOrder::Desc => "DESC",
                };
                format!("{} {}, rowid", field.column(), direction)
            }
            None => "rowid".to_string(),
        };

        let rows = sqlx::query(&format!(
            "SELECT {} FROM group_members WHERE {} ORDER BY {} LIMIT ?3 OFFSET ?4",
            MEMBER_COLUMNS, MEMBER_FILTER, order
        ))
        .bind(group_id)
        .bind(&search)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(MemberPage {
            members: rows.iter().map(member_from_row).collect(),
            total_count: total.max(0) as usize,
        })
    }

    /// Get a member of a group by ID.
    pub async fn get_member(
        &self,
        group_id: &str,
        id: &str,
    ) -> Result<Option<GroupMember>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM group_members WHERE id = ? AND group_id = ?",
            MEMBER_COLUMNS
        ))
        .bind(id)
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(member_from_row))
    }
}

#[async_trait]
impl MemberSource for Repository {
    async fn fetch_members_page(
        &self,
        group_id: &str,
        query: &PageQuery,
    ) -> Result<MemberPage, AppError> {
        if self.get_group(group_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Group {} not found", group_id)));
        }
        self.list_members_page(group_id, query).await
    }
}

#[async_trait]
impl GroupSubmitter for Repository {
    async fn submit(&self, draft: GroupDraft) -> Result<Group, AppError> {
        match draft {
            GroupDraft::Create(request) => self.create_group(&request).await,
            GroupDraft::Edit { group_id, changes } => {
                self.apply_group_changes(&group_id, &changes).await
            }
        }
    }
}

async fn insert_member(
    conn: &mut SqliteConnection,
    group_id: &str,
    member: &NewMemberData,
    now: &str,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO group_members (id, group_id, full_name, national_id, role, phone_number, id_front_url, id_back_url, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(group_id)
    .bind(member.full_name.trim())
    .bind(member.national_id.trim())
    .bind(member.role.as_str())
    .bind(member.phone_number.trim())
    .bind(&member.id_front_url)
    .bind(&member.id_back_url)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}

fn check_group_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Group name is required".to_string()));
    }
    Ok(())
}

fn check_member(member: &NewMemberData) -> Result<(), AppError> {
    match missing_fields(member).first() {
        Some(err) => Err(AppError::Validation(err.message())),
        None => Ok(()),
    }
}

// Helper functions for row conversion

fn group_from_row(row: &sqlx::sqlite::SqliteRow) -> Group {
    Group {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn member_from_row(row: &sqlx::sqlite::SqliteRow) -> GroupMember {
    let role: String = row.get("role");
    GroupMember {
        id: row.get("id"),
        full_name: row.get("full_name"),
        national_id: row.get("national_id"),
        role: MemberRole::parse(&role).unwrap_or_default(),
        phone_number: row.get("phone_number"),
        id_front_url: row.get("id_front_url"),
        id_back_url: row.get("id_back_url"),
    }
}
