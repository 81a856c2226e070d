//! History snapshots for the two editing modes.

use crate::models::{temp_member_id, GroupMember, MemberPatch, NewMemberData};

use super::edit_log::EditLog;

/// Name and description of the group being edited.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupDetails {
    pub name: String,
    pub description: String,
}

/// Create-mode snapshot: the whole member list lives in memory.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CreateState {
    pub details: GroupDetails,
    pub members: Vec<GroupMember>,
}

impl CreateState {
    pub fn position(&self, id: &str) -> Option<usize> {
        self.members.iter().position(|member| member.id == id)
    }

    pub fn with_added(&self, data: NewMemberData) -> Self {
        let mut next = self.clone();
        next.members.push(GroupMember::provisional(data));
        next
    }

    /// Copy with `patch` applied to member `id`.
    ///
    /// Client ids follow the phone number, which stays unique, so the id is
    /// re-derived after the patch.
    pub fn with_updated(&self, id: &str, patch: &MemberPatch) -> Self {
        let mut next = self.clone();
        if let Some(pos) = next.position(id) {
            let member = &mut next.members[pos];
            patch.apply_to(member);
            member.id = temp_member_id(&member.phone_number);
        }
        next
    }

    pub fn with_removed(&self, id: &str) -> Self {
        let mut next = self.clone();
        next.members.retain(|member| member.id != id);
        next
    }
}

/// Edit-mode snapshot: pending changes on top of the persisted group.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditState {
    pub details: GroupDetails,
    pub log: EditLog,
}
