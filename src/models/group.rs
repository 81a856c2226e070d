//! Group models and the submission payloads for both editing modes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{MemberPatch, NewMemberData};

/// A persisted group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating a group together with its initial members.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewGroup {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub members: Vec<NewMemberData>,
}

/// Request body describing every pending change to an existing group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GroupChanges {
    /// Present only when the name was changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Present only when the description was changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub added_members: Vec<NewMemberData>,
    #[serde(default)]
    pub updated_members: BTreeMap<String, MemberPatch>,
    #[serde(default)]
    pub deleted_member_ids: Vec<String>,
}

impl GroupChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.added_members.is_empty()
            && self.updated_members.is_empty()
            && self.deleted_member_ids.is_empty()
    }
}

/// Everything handed to the submission collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupDraft {
    Create(NewGroup),
    Edit {
        group_id: String,
        changes: GroupChanges,
    },
}
